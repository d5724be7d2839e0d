use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

pub const GROUP_COUNT: u8 = 25;

pub const ANIMALS: [&str; 25] = [
    "Avestruz", "Águia", "Burro", "Borboleta", "Cachorro", "Cabra", "Carneiro",
    "Camelo", "Cobra", "Coelho", "Cavalo", "Elefante", "Galo", "Gato", "Jacaré",
    "Leão", "Macaco", "Porco", "Pavão", "Peru", "Touro", "Tigre", "Urso", "Veado", "Vaca",
];

/// Un des 25 groupes (animaux), chacun propriétaire de 4 dezenas consécutives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Group(u8);

impl Group {
    pub fn new(number: u8) -> Result<Self, ModelError> {
        if (1..=GROUP_COUNT).contains(&number) {
            Ok(Group(number))
        } else {
            Err(ModelError::GroupOutOfRange(number))
        }
    }

    pub fn number(self) -> u8 {
        self.0
    }

    pub fn animal(self) -> &'static str {
        ANIMALS[(self.0 - 1) as usize]
    }

    /// Dezena 00 → groupe 25, sinon ceil(d / 4).
    pub fn from_dezena(dezena: u8) -> Self {
        let d = dezena % 100;
        if d == 0 { Group(25) } else { Group(d.div_ceil(4)) }
    }

    pub fn from_dezena_str(dezena: &str) -> Result<Self, ModelError> {
        if dezena.is_empty() || dezena.len() > 2 || !dezena.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ModelError::InvalidDezena(dezena.to_string()));
        }
        let value: u8 = dezena
            .parse()
            .map_err(|_| ModelError::InvalidDezena(dezena.to_string()))?;
        Ok(Self::from_dezena(value))
    }

    /// Les 4 dezenas du groupe, dans l'ordre (le groupe 25 finit par "00").
    pub fn dezena_values(self) -> [u8; 4] {
        let base = (self.0 as u16 - 1) * 4;
        [0u16, 1, 2, 3].map(|i| ((base + i + 1) % 100) as u8)
    }

    pub fn dezenas(self) -> [String; 4] {
        self.dezena_values().map(|d| format!("{:02}", d))
    }

    pub fn all() -> impl Iterator<Item = Group> {
        (1..=GROUP_COUNT).map(Group)
    }
}

impl TryFrom<u8> for Group {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Group::new(value)
    }
}

impl From<Group> for u8 {
    fn from(group: Group) -> u8 {
        group.0
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Les six extractions quotidiennes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Timeslot {
    #[serde(rename = "09h")]
    H09,
    #[serde(rename = "11h")]
    H11,
    #[serde(rename = "14h")]
    H14,
    #[serde(rename = "16h")]
    H16,
    #[serde(rename = "18h")]
    H18,
    #[serde(rename = "21h")]
    H21,
}

impl Timeslot {
    pub const ALL: [Timeslot; 6] = [
        Timeslot::H09,
        Timeslot::H11,
        Timeslot::H14,
        Timeslot::H16,
        Timeslot::H18,
        Timeslot::H21,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Timeslot::H09 => "09h",
            Timeslot::H11 => "11h",
            Timeslot::H14 => "14h",
            Timeslot::H16 => "16h",
            Timeslot::H18 => "18h",
            Timeslot::H21 => "21h",
        }
    }

    pub fn extraction(self) -> &'static str {
        match self {
            Timeslot::H09 => "PT/PPT",
            Timeslot::H11 => "PTM",
            Timeslot::H14 => "PT",
            Timeslot::H16 => "PTV",
            Timeslot::H18 => "PTN",
            Timeslot::H21 => "Coruja",
        }
    }

    pub fn hour(self) -> u32 {
        match self {
            Timeslot::H09 => 9,
            Timeslot::H11 => 11,
            Timeslot::H14 => 14,
            Timeslot::H16 => 16,
            Timeslot::H18 => 18,
            Timeslot::H21 => 21,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Timeslot::H09 => 0,
            Timeslot::H11 => 1,
            Timeslot::H14 => 2,
            Timeslot::H16 => 3,
            Timeslot::H18 => 4,
            Timeslot::H21 => 5,
        }
    }

    /// Extraction en cours pour une heure d'horloge.
    pub fn for_hour(hour: u32) -> Self {
        match hour {
            8..=10 => Timeslot::H09,
            11..=13 => Timeslot::H11,
            14..=15 => Timeslot::H14,
            16..=17 => Timeslot::H16,
            18..=20 => Timeslot::H18,
            _ => Timeslot::H21,
        }
    }

    /// Prochaine extraction à partir d'une heure d'horloge.
    pub fn next_after(hour: u32) -> Self {
        match hour {
            0..=8 => Timeslot::H09,
            9..=10 => Timeslot::H11,
            11..=13 => Timeslot::H14,
            14..=15 => Timeslot::H16,
            16..=17 => Timeslot::H18,
            _ => Timeslot::H21,
        }
    }
}

impl FromStr for Timeslot {
    type Err = ModelError;

    /// Accepte "14h", "14", "14:20" ou "9h".
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits: String = trimmed.chars().take_while(|c| c.is_ascii_digit()).collect();
        let rest = &trimmed[digits.len()..];
        let suffix_ok = rest.is_empty()
            || rest.eq_ignore_ascii_case("h")
            || (rest.starts_with(':') && rest[1..].chars().all(|c| c.is_ascii_digit()));
        if digits.is_empty() || !suffix_ok {
            return Err(ModelError::UnknownTimeslot(s.to_string()));
        }
        let hour: u32 = digits
            .parse()
            .map_err(|_| ModelError::UnknownTimeslot(s.to_string()))?;
        Self::ALL
            .into_iter()
            .find(|t| t.hour() == hour)
            .ok_or_else(|| ModelError::UnknownTimeslot(s.to_string()))
    }
}

impl fmt::Display for Timeslot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Nombre de chiffres demandé : dezena (2), centena (3) ou milhar (4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DigitWidth {
    Two,
    Three,
    Four,
}

impl DigitWidth {
    pub fn digits(self) -> usize {
        match self {
            DigitWidth::Two => 2,
            DigitWidth::Three => 3,
            DigitWidth::Four => 4,
        }
    }

    /// Cadre une chaîne numérique sur la largeur : garde les derniers chiffres, complète par des zéros à gauche.
    pub fn format(self, raw: &str) -> String {
        format_width(raw, self.digits())
    }
}

impl TryFrom<u8> for DigitWidth {
    type Error = ModelError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(DigitWidth::Two),
            3 => Ok(DigitWidth::Three),
            4 => Ok(DigitWidth::Four),
            other => Err(ModelError::InvalidWidth(other)),
        }
    }
}

impl From<DigitWidth> for u8 {
    fn from(width: DigitWidth) -> u8 {
        width.digits() as u8
    }
}

impl fmt::Display for DigitWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.digits())
    }
}

pub fn format_width(raw: &str, width: usize) -> String {
    let chars: Vec<char> = raw.trim().chars().collect();
    let start = chars.len().saturating_sub(width);
    let tail: String = chars[start..].iter().collect();
    format!("{:0>width$}", tail, width = width)
}

/// Valide une milhar saisie (2 à 4 chiffres) et la complète sur 4 chiffres.
pub fn normalize_milhar(raw: &str) -> Result<String, ModelError> {
    let s = raw.trim();
    if !(2..=4).contains(&s.len()) || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ModelError::InvalidMilhar(raw.to_string()));
    }
    Ok(format_width(s, 4))
}

/// Valide un nombre gagnant saisi : chiffres uniquement, au plus `width` chiffres, complété à gauche.
pub fn normalize_hit_number(raw: &str, width: DigitWidth) -> Result<String, ModelError> {
    let s = raw.trim();
    if s.is_empty() || s.len() > width.digits() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ModelError::InvalidHitNumber(raw.to_string(), width.digits()));
    }
    Ok(width.format(s))
}

/// Modalités de pari et leur nombre de chiffres.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Modality {
    Milhar,
    MilharCentena,
    Centena,
    Dezena,
    Grupo,
    DuqueDezena,
    TernoDezena,
    TernoGrupo,
    DuqueGrupo,
    Palpitao,
}

impl Modality {
    pub const ALL: [Modality; 10] = [
        Modality::Milhar,
        Modality::MilharCentena,
        Modality::Centena,
        Modality::Dezena,
        Modality::Grupo,
        Modality::DuqueDezena,
        Modality::TernoDezena,
        Modality::TernoGrupo,
        Modality::DuqueGrupo,
        Modality::Palpitao,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Modality::Milhar => "milhar",
            Modality::MilharCentena => "milhar-centena",
            Modality::Centena => "centena",
            Modality::Dezena => "dezena",
            Modality::Grupo => "grupo",
            Modality::DuqueDezena => "duque-dezena",
            Modality::TernoDezena => "terno-dezena",
            Modality::TernoGrupo => "terno-grupo",
            Modality::DuqueGrupo => "duque-grupo",
            Modality::Palpitao => "palpitao",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Modality::Milhar => "Milhar",
            Modality::MilharCentena => "Milhar Centena",
            Modality::Centena => "Centena",
            Modality::Dezena => "Dezena",
            Modality::Grupo => "Grupo",
            Modality::DuqueDezena => "Duque Dezena",
            Modality::TernoDezena => "Terno de Dezena",
            Modality::TernoGrupo => "Terno de Grupo",
            Modality::DuqueGrupo => "Duque de Grupo",
            Modality::Palpitao => "Palpitão",
        }
    }

    /// Multiplicateur de gain affiché.
    pub fn payout(self) -> &'static str {
        match self {
            Modality::Milhar | Modality::MilharCentena => "4000x",
            Modality::Centena => "600x",
            Modality::Dezena => "60x",
            Modality::Grupo => "18x",
            Modality::DuqueDezena => "300x",
            Modality::TernoDezena => "3000x",
            Modality::TernoGrupo => "130x",
            Modality::DuqueGrupo => "18.5x",
            Modality::Palpitao => "800x",
        }
    }

    pub fn width(self) -> DigitWidth {
        match self {
            Modality::Milhar | Modality::MilharCentena | Modality::Palpitao => DigitWidth::Four,
            Modality::Centena => DigitWidth::Three,
            _ => DigitWidth::Two,
        }
    }
}

impl FromStr for Modality {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownModality(s.to_string()))
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Un résultat officiel : un prix d'une extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawResult {
    pub date: NaiveDate,
    pub timeslot: Timeslot,
    pub prize: u8,
    pub milhar: String,
    pub dezena: String,
    pub group: Group,
}

impl DrawResult {
    pub fn new(date: NaiveDate, timeslot: Timeslot, prize: u8, milhar: &str) -> Result<Self, ModelError> {
        if !(1..=10).contains(&prize) {
            return Err(ModelError::PrizeOutOfRange(prize));
        }
        let milhar = normalize_milhar(milhar)?;
        let dezena = milhar[2..].to_string();
        let group = Group::from_dezena_str(&dezena)?;
        Ok(Self { date, timeslot, prize, milhar, dezena, group })
    }

    pub fn animal(&self) -> &'static str {
        self.group.animal()
    }

    /// 0 = dimanche … 6 = samedi.
    pub fn weekday_index(&self) -> u32 {
        self.date.weekday().num_days_from_sunday()
    }
}

/// Un succès confirmé par l'utilisateur.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserHit {
    pub id: Option<i64>,
    pub numbers: Vec<String>,
    pub group: Option<Group>,
    pub modality: Modality,
    pub width: DigitWidth,
    pub date: NaiveDate,
    pub timeslot: Timeslot,
    pub methods: Vec<String>,
}

impl UserHit {
    /// Gain validé : chaque nombre est numérique et cadré sur `width`.
    pub fn new(
        numbers: &[String],
        group: Option<Group>,
        modality: Modality,
        width: DigitWidth,
        date: NaiveDate,
        timeslot: Timeslot,
        methods: Vec<String>,
    ) -> Result<Self, ModelError> {
        let numbers = numbers
            .iter()
            .map(|n| normalize_hit_number(n, width))
            .collect::<Result<Vec<_>, _>>()?;
        let hit = Self { id: None, numbers, group, modality, width, date, timeslot, methods };
        hit.validate()?;
        Ok(hit)
    }

    /// Nombres exactement de la largeur déclarée et tous numériques, au moins un nombre ou un groupe.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.numbers.is_empty() && self.group.is_none() {
            return Err(ModelError::EmptyHit);
        }
        let digits = self.width.digits();
        for n in &self.numbers {
            if n.len() != digits || !n.bytes().all(|b| b.is_ascii_digit()) {
                return Err(ModelError::InvalidHitNumber(n.clone(), digits));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    Group,
    TimeslotGroup,
    WeekdayGroup,
    HotGroup,
    ColdGroup,
    TimeslotCorrelation,
    Transition,
    FrequentDezena,
    WeekdayPattern,
    FrequentTerminal,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PatternKind::Group => "grupo",
            PatternKind::TimeslotGroup => "horario_grupo",
            PatternKind::WeekdayGroup => "dia_grupo",
            PatternKind::HotGroup => "grupo_quente",
            PatternKind::ColdGroup => "grupo_frio",
            PatternKind::TimeslotCorrelation => "correlacao_horario",
            PatternKind::Transition => "sequencia",
            PatternKind::FrequentDezena => "dezena_frequente",
            PatternKind::WeekdayPattern => "padrao_dia_semana",
            PatternKind::FrequentTerminal => "terminacao_frequente",
        }
    }

    const ALL: [PatternKind; 10] = [
        PatternKind::Group,
        PatternKind::TimeslotGroup,
        PatternKind::WeekdayGroup,
        PatternKind::HotGroup,
        PatternKind::ColdGroup,
        PatternKind::TimeslotCorrelation,
        PatternKind::Transition,
        PatternKind::FrequentDezena,
        PatternKind::WeekdayPattern,
        PatternKind::FrequentTerminal,
    ];
}

impl FromStr for PatternKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| ModelError::UnknownPatternKind(s.to_string()))
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Renforcement borné : poids initial, incrément, plafond.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightRule {
    pub base: f64,
    pub delta: f64,
    pub ceiling: f64,
}

impl WeightRule {
    /// min(poids + δ, plafond), sans jamais faire baisser un poids.
    pub fn apply(&self, weight: f64) -> f64 {
        (weight + self.delta).min(self.ceiling).max(weight)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearnedPattern {
    pub kind: PatternKind,
    pub value: String,
    pub frequency: u32,
    pub weight: f64,
    pub hit_rate: f64,
    pub last_seen: Option<NaiveDate>,
    pub context: serde_json::Value,
}

/// Clé "14h_9".
pub fn timeslot_group_key(timeslot: Timeslot, group: Group) -> String {
    format!("{}_{}", timeslot.label(), group.number())
}

/// Clé "dia3_9" (0 = dimanche).
pub fn weekday_group_key(weekday_index: u32, group: Group) -> String {
    format!("dia{}_{}", weekday_index, group.number())
}

/// Extrait le groupe d'une clé "xxx_9".
pub fn group_from_key(value: &str) -> Option<Group> {
    value
        .rsplit('_')
        .next()
        .and_then(|g| g.parse::<u8>().ok())
        .and_then(|g| Group::new(g).ok())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingPrediction {
    pub id: Option<i64>,
    pub date: NaiveDate,
    pub timeslot: Timeslot,
    pub numbers: Vec<String>,
    pub groups: Vec<Group>,
    pub confidence: u8,
    pub methods: Vec<String>,
    pub hit: Option<bool>,
    pub matched: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningMetrics {
    pub total_predictions: u32,
    pub total_hits: u32,
    pub hit_rate: f64,
    pub best_group: Option<Group>,
    pub best_timeslot: Option<Timeslot>,
    pub updated_at: Option<String>,
}

/// Historique synthétique, le plus récent en premier, une extraction par créneau.
pub fn make_test_results(n: usize) -> Vec<DrawResult> {
    let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or(NaiveDate::MIN);
    let last_day = n.saturating_sub(1) / 6;
    (0..n)
        .map(|i| {
            let date = start + chrono::Days::new((last_day - i / 6) as u64);
            let timeslot = Timeslot::ALL[5 - (i % 6)];
            let milhar = format!("{:04}", (i * 37 + 13) % 10_000);
            let dezena = milhar[2..].to_string();
            let group = Group::from_dezena(((i * 37 + 13) % 100) as u8);
            DrawResult { date, timeslot, prize: 1, milhar, dezena, group }
        })
        .collect()
}
