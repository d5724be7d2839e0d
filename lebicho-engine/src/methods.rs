use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

use lebicho_db::error::ModelError;
use lebicho_db::models::{DigitWidth, Group};

use crate::config::EngineConfig;
use crate::reading::group_of;
use crate::sampler::{RandomSource, pick_distinct, pick_index};
use crate::scorer::lunar::phase_index;
use crate::tables::{BIBLICAL, ENOCH, FIBONACCI, KABBALISTIC, LO_SHU, SIGNS, tesla_369};

/// Année de référence de l'année personnelle en numérologie.
const PERSONAL_YEAR_BASE: u64 = 2024;

const CONFIDENCE_BASE: u8 = 70;
const CONFIDENCE_SPREAD: usize = 30;

/// Méthodes de lecture isolées, hors canal magnétique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "fibonacci")]
    Fibonacci,
    #[serde(rename = "tesla")]
    Tesla,
    #[serde(rename = "numerologia")]
    Numerology,
    #[serde(rename = "kabbalah")]
    Kabbalah,
    #[serde(rename = "astrologia")]
    Astrology,
    #[serde(rename = "cosmico")]
    Cosmic,
    #[serde(rename = "quantica")]
    Quantum,
    #[serde(rename = "lei-atracao")]
    Attraction,
    #[serde(rename = "lei-suposicao")]
    Assumption,
    #[serde(rename = "biblia")]
    Biblical,
    #[serde(rename = "apocrifos")]
    Apocrypha,
    #[serde(rename = "magia")]
    Magic,
}

impl Method {
    pub const ALL: [Method; 12] = [
        Method::Fibonacci,
        Method::Tesla,
        Method::Numerology,
        Method::Kabbalah,
        Method::Astrology,
        Method::Cosmic,
        Method::Quantum,
        Method::Attraction,
        Method::Assumption,
        Method::Biblical,
        Method::Apocrypha,
        Method::Magic,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Method::Fibonacci => "fibonacci",
            Method::Tesla => "tesla",
            Method::Numerology => "numerologia",
            Method::Kabbalah => "kabbalah",
            Method::Astrology => "astrologia",
            Method::Cosmic => "cosmico",
            Method::Quantum => "quantica",
            Method::Attraction => "lei-atracao",
            Method::Assumption => "lei-suposicao",
            Method::Biblical => "biblia",
            Method::Apocrypha => "apocrifos",
            Method::Magic => "magia",
        }
    }

    fn confidence_bonus(self) -> u8 {
        match self {
            Method::Numerology => 5,
            Method::Magic => 8,
            Method::Cosmic => 10,
            _ => 0,
        }
    }
}

impl FromStr for Method {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.id().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodReading {
    pub method: Method,
    pub numbers: Vec<String>,
    pub top_group: Option<Group>,
    pub explanation: String,
    pub energy: String,
    pub confidence: u8,
}

/// Garde les `width` derniers chiffres de `n`.
fn reduce(n: u64, width: DigitWidth) -> String {
    let digits = width.digits();
    format!("{:0digits$}", n % 10u64.pow(digits as u32))
}

fn sum_digits(mut n: u64) -> u64 {
    let mut sum = 0;
    while n > 0 {
        sum += n % 10;
        n /= 10;
    }
    sum
}

fn joined(values: &[u32]) -> String {
    values.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(", ")
}

/// Lecture d'une seule méthode à l'instant `now` : 3 nombres au plus (doublons retirés),
/// le groupe du premier, une explication et une confiance entre 70 et le plafond du moteur.
pub fn generate_method(
    method: Method,
    now: NaiveDateTime,
    width: DigitWidth,
    config: &EngineConfig,
    rng: &mut dyn RandomSource,
) -> MethodReading {
    let day = now.day() as u64;
    let month = now.month() as u64;
    let year = now.year().max(0) as u64;
    let hour = now.hour() as u64;
    let minute = now.minute() as u64;

    let base = CONFIDENCE_BASE + pick_index(rng, CONFIDENCE_SPREAD) as u8;
    let confidence = base.saturating_add(method.confidence_bonus()).min(config.confidence_ceiling);

    let (raw, explanation, energy): (Vec<u64>, String, String) = match method {
        Method::Fibonacci => {
            let picked = pick_distinct(&FIBONACCI, 3, rng);
            (
                picked.iter().map(|&n| n as u64 * day + month).collect(),
                format!("Nombres d'or {} combinés à la date du jour.", joined(&picked)),
                "Harmonie naturelle".to_string(),
            )
        }
        Method::Tesla => {
            let series: Vec<u32> = tesla_369().collect();
            let picked = pick_distinct(&series, 3, rng);
            (
                picked.iter().map(|&n| n as u64 + hour).collect(),
                format!("Multiples de 3, 6 et 9 ({}) accordés à l'heure courante.", joined(&picked)),
                "Énergie universelle".to_string(),
            )
        }
        Method::Numerology => {
            let life = sum_digits(day + month + sum_digits(year));
            let personal = sum_digits(day + month + sum_digits(PERSONAL_YEAR_BASE));
            (
                vec![life * 11, personal * 7, (life + personal) * 9],
                format!("Nombre de vie {life}, année personnelle {personal}, sous l'influence du maître-nombre 11."),
                "Vibration personnelle".to_string(),
            )
        }
        Method::Kabbalah => {
            let picked = pick_distinct(&KABBALISTIC, 3, rng);
            (
                picked.iter().map(|&n| n as u64 * (day % 10 + 1)).collect(),
                format!("Sephiroth {} de l'Arbre de Vie.", joined(&picked)),
                "Sagesse ancestrale".to_string(),
            )
        }
        Method::Astrology => {
            let sign = &SIGNS[(month as usize + 11) % 12];
            (
                sign.numbers.iter().take(3).map(|&n| n as u64 + day).collect(),
                format!(
                    "Le Soleil traverse {} ({}), élément {} ; nombres régents {}.",
                    sign.name,
                    sign.symbol,
                    sign.element,
                    joined(&sign.numbers)
                ),
                format!("Élément {}", sign.element),
            )
        }
        Method::Cosmic => {
            let moon = phase_index(now.date(), config.lunar_reference, config.lunar_cycle_days) as u64;
            let astral = (day * month + hour) % 100;
            (
                vec![moon, astral, moon + astral],
                format!("Phase lunaire {moon}% et alignement astral {astral}."),
                "Portail cosmique".to_string(),
            )
        }
        Method::Quantum => {
            let seed = pick_index(rng, 10_000) as u64;
            (
                vec![seed * 3 % 100, seed * 7 % 100, seed * 11 % 100],
                "Effondrement de la fonction d'onde sur trois probabilités.".to_string(),
                "Champ quantique".to_string(),
            )
        }
        Method::Attraction => {
            let intention = sum_digits(day * month * hour);
            (
                vec![intention * 8, intention * 88, intention * 888],
                format!("Intention {intention} multipliée par le 8 de l'abondance."),
                "Abondance".to_string(),
            )
        }
        Method::Assumption => {
            let imagined = (hour * 60 + minute) % 100;
            (
                vec![imagined, imagined + 11, imagined + 22],
                format!("Minute imaginée {imagined} amplifiée par les maîtres-nombres 11 et 22."),
                "Imagination créatrice".to_string(),
            )
        }
        Method::Biblical => {
            let picked = pick_distinct(&BIBLICAL, 3, rng);
            (
                picked.iter().map(|&n| n as u64).collect(),
                format!("Nombres sacrés {}.", joined(&picked)),
                "Grâce divine".to_string(),
            )
        }
        Method::Apocrypha => {
            let picked = pick_distinct(&ENOCH, 3, rng);
            (
                picked.iter().map(|&n| n as u64 + day).collect(),
                format!("Multiples de 7 du Livre d'Hénoch ({}).", joined(&picked)),
                "Connaissance cachée".to_string(),
            )
        }
        Method::Magic => {
            let picked = pick_distinct(&LO_SHU, 3, rng);
            let sum: u64 = picked.iter().map(|&n| n as u64).sum();
            (
                vec![sum * day, picked[0] as u64 * picked[1] as u64, picked[1] as u64 * picked[2] as u64],
                format!("Carré Lo Shu ({}), somme {sum}.", joined(&picked)),
                "Magie ancestrale".to_string(),
            )
        }
    };

    let mut numbers: Vec<String> = Vec::with_capacity(raw.len());
    for n in raw {
        let formatted = reduce(n, width);
        if !numbers.contains(&formatted) {
            numbers.push(formatted);
        }
    }

    MethodReading {
        method,
        top_group: numbers.first().and_then(|n| group_of(n)),
        numbers,
        explanation,
        energy,
        confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::SeededSource;
    use chrono::NaiveDate;

    fn at(hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 1, 9).unwrap().and_hms_opt(hour, minute, 0).unwrap()
    }

    fn run(method: Method, width: DigitWidth) -> MethodReading {
        generate_method(method, at(10, 30), width, &EngineConfig::default(), &mut SeededSource::new(11))
    }

    #[test]
    fn test_method_ids() {
        for m in Method::ALL {
            assert_eq!(m.id().parse::<Method>().unwrap(), m);
        }
        assert_eq!("LEI-ATRACAO".parse::<Method>().unwrap(), Method::Attraction);
        assert!("sao-cipriano".parse::<Method>().is_err());
        assert_eq!(serde_json::to_string(&Method::Assumption).unwrap(), "\"lei-suposicao\"");
    }

    #[test]
    fn test_numerology() {
        // vie : 9+1+10 → 2 ; année personnelle : 9+1+8 → 9
        let r = run(Method::Numerology, DigitWidth::Two);
        assert_eq!(r.numbers, vec!["22", "63", "99"]);
        assert_eq!(r.top_group, Some(Group::new(6).unwrap()));
        assert!((75..=98).contains(&r.confidence));
    }

    #[test]
    fn test_clock_methods() {
        // 10h30 → 630 % 100
        assert_eq!(run(Method::Assumption, DigitWidth::Two).numbers, vec!["30", "41", "52"]);
        // 9 × 1 × 10 = 90 → 9
        assert_eq!(run(Method::Attraction, DigitWidth::Four).numbers, vec!["0072", "0792", "7992"]);
        // 729 jours après la nouvelle lune de référence → phase 68 ; 9 × 1 + 10 = 19
        assert_eq!(run(Method::Cosmic, DigitWidth::Two).numbers, vec!["68", "19", "87"]);
    }

    #[test]
    fn test_astrology_uses_month_sign() {
        // janvier → Áries [1, 9, 17] + 9
        let r = run(Method::Astrology, DigitWidth::Two);
        assert_eq!(r.numbers, vec!["10", "18", "26"]);
        assert_eq!(r.top_group, Some(Group::new(3).unwrap()));
        assert_eq!(r.energy, "Élément Fogo");
    }

    #[test]
    fn test_every_method_shape() {
        let config = EngineConfig::default();
        for method in Method::ALL {
            for seed in 0..10 {
                let r = generate_method(method, at(21, 5), DigitWidth::Three, &config, &mut SeededSource::new(seed));
                assert!(!r.numbers.is_empty() && r.numbers.len() <= 3, "{method}");
                assert!(r.numbers.iter().all(|n| n.len() == 3 && n.bytes().all(|b| b.is_ascii_digit())));
                assert!((70..=98).contains(&r.confidence));
                assert!(r.top_group.is_some());
                assert!(!r.explanation.is_empty());
            }
        }
    }

    #[test]
    fn test_magic_products() {
        let r = run(Method::Magic, DigitWidth::Four);
        let n: Vec<u64> = r.numbers.iter().map(|s| s.parse().unwrap()).collect();
        // s0·s1 et s1·s2 sont des produits de cases du carré (max 9 × 8)
        assert!(n.iter().skip(1).all(|&v| v <= 72));
        assert_eq!(n[0] % 9, 0);
    }
}
