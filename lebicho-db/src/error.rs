/// Erreurs de validation du modèle de données.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("milhar invalide : '{0}' (2 à 4 chiffres attendus)")]
    InvalidMilhar(String),

    #[error("prix {0} hors limites (1-10)")]
    PrizeOutOfRange(u8),

    #[error("horaire inconnu : '{0}'")]
    UnknownTimeslot(String),

    #[error("largeur invalide : {0} (2, 3 ou 4 chiffres)")]
    InvalidWidth(u8),

    #[error("groupe {0} hors limites (1-25)")]
    GroupOutOfRange(u8),

    #[error("dezena invalide : '{0}'")]
    InvalidDezena(String),

    #[error("type de motif inconnu : '{0}'")]
    UnknownPatternKind(String),

    #[error("nombre gagnant invalide : '{0}' (chiffres uniquement, {1} au plus)")]
    InvalidHitNumber(String, usize),

    #[error("modalité inconnue : '{0}'")]
    UnknownModality(String),

    #[error("méthode inconnue : '{0}'")]
    UnknownMethod(String),

    #[error("gain vide : au moins un nombre ou un groupe")]
    EmptyHit,
}
