//! Tables statiques d'amorçage, relevées sur des résultats réels
//! (30/12/2025 au 09/01/2026). Elles garantissent un pool non vide sans historique.

use lebicho_db::models::Timeslot;

/// (groupe, fréquence) par horaire, dans l'ordre de `Timeslot::ALL`.
pub const FREQUENCY_BY_TIMESLOT: [&[(u8, u32)]; 6] = [
    // 09h PT/PPT
    &[(7, 5), (13, 4), (9, 3), (17, 3), (4, 2), (8, 2), (3, 2)],
    // 11h PTM
    &[(9, 6), (22, 3), (18, 2), (24, 2), (10, 2)],
    // 14h PT
    &[(18, 5), (7, 3), (9, 3), (21, 2), (14, 2)],
    // 16h PTV
    &[(9, 4), (18, 3), (10, 2), (24, 2), (22, 2)],
    // 18h PTN
    &[(22, 3), (7, 2), (16, 2), (5, 2)],
    // 21h Coruja
    &[(9, 5), (24, 3), (17, 2), (21, 2)],
];

/// Classement général (groupe, fréquence).
pub const HOT_GROUPS: &[(u8, u32)] = &[
    (9, 14), (7, 9), (18, 8), (8, 7), (13, 7),
    (17, 6), (24, 5), (22, 5), (16, 4), (10, 4),
];

/// Terminaisons fréquentes (dezena, fréquence).
pub const HOT_DEZENAS: &[(u8, u32)] = &[
    (9, 8), (18, 6), (7, 5), (14, 5), (17, 4),
    (22, 4), (24, 4), (21, 3), (13, 3), (12, 3),
];

/// Groupes dominants par jour de la semaine (0 = dimanche), du plus fort au plus faible.
pub const WEEKDAY_TRENDS: [[u8; 3]; 7] = [
    [9, 24, 17],
    [7, 9, 18],
    [9, 13, 22],
    [7, 18, 16],
    [9, 7, 17],
    [18, 9, 24],
    [9, 7, 10],
];

pub const FIBONACCI: [u32; 11] = [1, 1, 2, 3, 5, 8, 13, 21, 34, 55, 89];

pub const GOLDEN_RATIO_FRACTION: f64 = 0.618;

pub const BIBLICAL: [u32; 11] = [3, 7, 12, 40, 70, 77, 144, 666, 777, 888, 1000];

pub const KABBALISTIC: [u32; 13] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 22, 33];

/// Multiples de 7 du Livre d'Hénoch.
pub const ENOCH: [u32; 14] = [7, 14, 21, 28, 35, 42, 49, 56, 63, 70, 77, 84, 91, 98];

/// Carré magique Lo Shu, ligne par ligne.
pub const LO_SHU: [u32; 9] = [2, 7, 6, 9, 5, 1, 4, 3, 8];

pub struct Sign {
    pub name: &'static str,
    pub symbol: &'static str,
    pub element: &'static str,
    pub numbers: [u32; 4],
}

/// Signes du zodiaque, de janvier (Bélier) à décembre (Poissons).
pub const SIGNS: [Sign; 12] = [
    Sign { name: "Áries", symbol: "♈", element: "Fogo", numbers: [1, 9, 17, 25] },
    Sign { name: "Touro", symbol: "♉", element: "Terra", numbers: [2, 6, 14, 21] },
    Sign { name: "Gêmeos", symbol: "♊", element: "Ar", numbers: [3, 5, 12, 23] },
    Sign { name: "Câncer", symbol: "♋", element: "Água", numbers: [4, 7, 16, 22] },
    Sign { name: "Leão", symbol: "♌", element: "Fogo", numbers: [1, 8, 16, 19] },
    Sign { name: "Virgem", symbol: "♍", element: "Terra", numbers: [5, 14, 23, 32] },
    Sign { name: "Libra", symbol: "♎", element: "Ar", numbers: [6, 15, 24, 33] },
    Sign { name: "Escorpião", symbol: "♏", element: "Água", numbers: [9, 18, 27, 36] },
    Sign { name: "Sagitário", symbol: "♐", element: "Fogo", numbers: [3, 12, 21, 30] },
    Sign { name: "Capricórnio", symbol: "♑", element: "Terra", numbers: [8, 17, 26, 35] },
    Sign { name: "Aquário", symbol: "♒", element: "Ar", numbers: [4, 13, 22, 31] },
    Sign { name: "Peixes", symbol: "♓", element: "Água", numbers: [7, 16, 25, 34] },
];

/// Multiples de 3 jusqu'à 99.
pub fn tesla_369() -> impl Iterator<Item = u32> {
    (1..=33).map(|k| k * 3)
}

pub fn timeslot_frequencies(timeslot: Timeslot) -> &'static [(u8, u32)] {
    FREQUENCY_BY_TIMESLOT[timeslot.index()]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lebicho_db::models::GROUP_COUNT;

    #[test]
    fn test_lo_shu_is_magic() {
        for row in LO_SHU.chunks(3) {
            assert_eq!(row.iter().sum::<u32>(), 15);
        }
        for col in 0..3 {
            assert_eq!(LO_SHU[col] + LO_SHU[col + 3] + LO_SHU[col + 6], 15);
        }
    }

    #[test]
    fn test_tables_reference_valid_groups() {
        let all_groups = FREQUENCY_BY_TIMESLOT
            .iter()
            .flat_map(|t| t.iter().map(|&(g, _)| g))
            .chain(HOT_GROUPS.iter().map(|&(g, _)| g))
            .chain(WEEKDAY_TRENDS.iter().flatten().copied());
        for g in all_groups {
            assert!((1..=GROUP_COUNT).contains(&g), "groupe invalide {g}");
        }
        assert!(HOT_DEZENAS.iter().all(|&(d, _)| d < 100));
    }

    #[test]
    fn test_tesla_369() {
        let values: Vec<u32> = tesla_369().collect();
        assert_eq!(values.len(), 33);
        assert_eq!(values[0], 3);
        assert_eq!(values[32], 99);
    }

    #[test]
    fn test_timeslot_frequencies_indexing() {
        assert_eq!(timeslot_frequencies(Timeslot::H11)[0], (9, 6));
        assert_eq!(timeslot_frequencies(Timeslot::H14)[0], (18, 5));
    }
}
