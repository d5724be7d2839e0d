use std::collections::BTreeSet;

use serde::Serialize;

use lebicho_db::models::{DigitWidth, Group};

use crate::sampler::{RandomSource, pick_index};

/// Table de São Cipriano : mot du rêve, groupe, signification.
const SAO_CIPRIANO: &[(&str, u8, &str)] = &[
    // animaux
    ("avestruz", 1, "Viagem, fuga, covardia"),
    ("águia", 2, "Poder, visão, liberdade"),
    ("burro", 3, "Trabalho duro, teimosia"),
    ("borboleta", 4, "Transformação, leveza, alma"),
    ("cachorro", 5, "Amizade, lealdade, proteção"),
    ("cabra", 6, "Teimosidade, força, fertilidade"),
    ("carneiro", 7, "Sacrifício, liderança, iniciativa"),
    ("camelo", 8, "Resistência, paciência, viagem"),
    ("cobra", 9, "Sabedoria, perigo, transformação"),
    ("coelho", 10, "Fertilidade, sorte, rapidez"),
    ("cavalo", 11, "Força, liberdade, nobreza"),
    ("elefante", 12, "Memória, força, sabedoria"),
    ("galo", 13, "Despertar, vigilância, orgulho"),
    ("gato", 14, "Mistério, independência, intuição"),
    ("jacaré", 15, "Perigo oculto, traição, paciência"),
    ("leão", 16, "Coragem, poder, realeza"),
    ("macaco", 17, "Astúcia, brincadeira, imitação"),
    ("porco", 18, "Abundância, fartura, prosperidade"),
    ("pavão", 19, "Vaidade, beleza, orgulho"),
    ("peru", 20, "Festa, celebração, abundância"),
    ("touro", 21, "Força, determinação, fertilidade"),
    ("tigre", 22, "Poder, agressividade, paixão"),
    ("urso", 23, "Força interior, introspecção"),
    ("veado", 24, "Graciosidade, sensibilidade"),
    ("vaca", 25, "Nutrição, abundância, maternidade"),
    // éléments
    ("água", 9, "Emoções, purificação"),
    ("fogo", 16, "Paixão, transformação"),
    ("terra", 12, "Estabilidade, abundância"),
    ("ar", 2, "Liberdade, pensamentos"),
    ("sol", 16, "Vitalidade, sucesso"),
    ("lua", 14, "Mistério, feminino, intuição"),
    ("estrela", 2, "Esperança, guia, destino"),
    ("chuva", 9, "Purificação, renovação"),
    ("rio", 15, "Fluxo da vida, jornada"),
    ("mar", 15, "Inconsciente, emoções profundas"),
    ("montanha", 12, "Obstáculos, conquistas"),
    ("floresta", 17, "Mistério, perigo, descoberta"),
    // personnes
    ("mãe", 25, "Nutrição, proteção, amor"),
    ("pai", 21, "Autoridade, proteção"),
    ("filho", 10, "Esperança, futuro, alegria"),
    ("criança", 10, "Inocência, novo começo"),
    ("bebê", 10, "Novo projeto, inocência"),
    ("mulher", 14, "Feminino, intuição, mistério"),
    ("homem", 21, "Força, ação, determinação"),
    ("amigo", 5, "Lealdade, companheirismo"),
    ("inimigo", 9, "Perigo, traição"),
    ("rei", 16, "Poder, autoridade, sucesso"),
    ("rainha", 16, "Poder feminino, nobreza"),
    ("padre", 7, "Espiritualidade, guia"),
    ("médico", 9, "Cura, sabedoria, ciência"),
    // objets
    ("dinheiro", 18, "Prosperidade, ganhos"),
    ("ouro", 18, "Riqueza, valor, poder"),
    ("prata", 14, "Lua, feminino, clareza"),
    ("casa", 6, "Segurança, família, lar"),
    ("carro", 11, "Viagem, movimento, status"),
    ("avião", 2, "Viagem, liberdade, ascensão"),
    ("barco", 15, "Viagem, emoções, jornada"),
    ("igreja", 7, "Fé, espiritualidade, paz"),
    ("cruz", 7, "Sacrifício, fé, proteção"),
    ("espada", 22, "Luta, coragem, verdade"),
    ("faca", 22, "Corte, separação, perigo"),
    ("arma", 22, "Agressão, defesa, poder"),
    ("livro", 1, "Conhecimento, sabedoria"),
    ("carta", 4, "Notícias, mensagens"),
    ("telefone", 4, "Comunicação, notícias"),
    ("espelho", 14, "Reflexão, vaidade, verdade"),
    ("relógio", 13, "Tempo, urgência, despertar"),
    // actions et événements
    ("morte", 9, "Transformação, fim de ciclo"),
    ("casamento", 24, "União, compromisso, amor"),
    ("nascimento", 10, "Novo começo, criação"),
    ("viagem", 11, "Mudança, aventura"),
    ("queda", 1, "Perda, fracasso, medo"),
    ("voo", 2, "Liberdade, sucesso, elevação"),
    ("briga", 22, "Conflito, tensão"),
    ("festa", 20, "Celebração, alegria"),
    ("choro", 9, "Emoção, purificação"),
    ("riso", 17, "Alegria, leveza"),
    ("medo", 9, "Perigo, alerta"),
    ("amor", 24, "União, paixão, carinho"),
    ("sexo", 24, "Desejo, intimidade"),
    ("gravidez", 25, "Criação, fertilidade"),
    // couleurs
    ("vermelho", 22, "Paixão, energia, perigo"),
    ("preto", 9, "Mistério, morte, poder"),
    ("branco", 1, "Pureza, paz, início"),
    ("verde", 10, "Esperança, natureza, cura"),
    ("azul", 2, "Paz, céu, espiritualidade"),
    ("amarelo", 16, "Sol, alegria, riqueza"),
    ("dourado", 18, "Riqueza, sucesso, divino"),
    // nombres
    ("três", 3, "Trindade, criação"),
    ("sete", 7, "Perfeição, espiritualidade"),
    ("treze", 13, "Transformação, azar/sorte"),
    // lieux
    ("cemitério", 9, "Fim de ciclo, memórias"),
    ("hospital", 9, "Cura, doença, cuidado"),
    ("escola", 1, "Aprendizado, conhecimento"),
    ("praia", 15, "Descanso, emoções"),
    ("fazenda", 25, "Trabalho, abundância"),
    // aliments
    ("pão", 18, "Sustento, abundância"),
    ("carne", 21, "Força, energia, desejo"),
    ("fruta", 10, "Saúde, fertilidade"),
    ("vinho", 18, "Celebração, sangue, alegria"),
];

/// Synonymes qui renvoient à une entrée de la table.
const RELATED_WORDS: &[(&str, &[&str])] = &[
    ("cobra", &["serpente", "víbora", "jararaca", "píton", "sucuri"]),
    ("cachorro", &["cão", "vira-lata", "pastor", "poodle", "pitbull"]),
    ("gato", &["felino", "gatinho", "bichano"]),
    ("cavalo", &["égua", "potro", "garanhão", "pônei"]),
    ("leão", &["leoa", "rei da selva", "felino grande"]),
    ("morte", &["morto", "falecido", "defunto", "finado", "caixão", "enterro", "funeral"]),
    ("água", &["rio", "mar", "lago", "piscina", "chuva", "oceano"]),
    ("dinheiro", &["grana", "nota", "moeda", "fortuna", "herança", "prêmio", "loteria"]),
    ("casa", &["lar", "residência", "apartamento", "moradia"]),
    ("carro", &["automóvel", "veículo", "moto", "caminhão"]),
    ("criança", &["menino", "menina", "bebê", "neném", "infante"]),
    ("mulher", &["moça", "senhora", "dama", "esposa", "namorada"]),
    ("homem", &["rapaz", "senhor", "marido", "namorado"]),
    ("sexo", &["prazer", "desejo", "paixão", "intimidade", "relação"]),
    ("briga", &["luta", "conflito", "discussão", "guerra", "batalha"]),
    ("viagem", &["viajar", "passeio", "mudança", "partida"]),
];

/// Dictionnaire de consultation : mot → groupes.
const DREAM_DICTIONARY: &[(&str, &[u8])] = &[
    ("aliança", &[1]), ("mesa", &[1]), ("pérola", &[1]), ("anel", &[1]), ("noiva", &[1]), ("noivo", &[1]),
    ("briga", &[2]), ("palhaço", &[2]), ("uva", &[2]), ("voo", &[2]), ("altura", &[2]), ("circo", &[2]),
    ("abrigo", &[3]), ("proteção", &[3]), ("livro", &[3]), ("estudo", &[3]), ("escola", &[3]), ("biblioteca", &[3]),
    ("criança", &[4]), ("crianças", &[4]), ("jardim", &[4]), ("lua", &[4]), ("montanha", &[4]), ("flores", &[4, 20]),
    ("bruxa", &[5]), ("deus", &[5]), ("raio", &[5]), ("sombra", &[5]), ("trovão", &[5]), ("tempestade", &[5]), ("feitiço", &[5]),
    ("escuridão", &[6]), ("bebê", &[6]), ("sol", &[6]), ("recém-nascido", &[6]), ("parto", &[6, 24]),
    ("janela", &[7]), ("lâmpada", &[7]), ("moeda", &[7]), ("ovo", &[7]), ("ouro", &[7]),
    ("amigo", &[8]), ("escada", &[8]), ("homem", &[8]), ("lápis", &[8]), ("pirâmide", &[8]), ("deserto", &[8]), ("viagem", &[8]),
    ("igreja", &[9]), ("mar", &[9]), ("noite", &[9]), ("ponte", &[9]), ("seios", &[9]), ("veneno", &[9]),
    ("beijo", &[10]), ("pedra", &[10]), ("amor", &[10]), ("namorado", &[10]), ("namorada", &[10]), ("paixão", &[10]),
    ("nudez", &[11]), ("sapato", &[11]), ("corrida", &[11]), ("velocidade", &[11]), ("nu", &[11]), ("nua", &[11]),
    ("anjo", &[12]), ("sangue", &[12]), ("força", &[12]), ("grande", &[12]), ("gigante", &[12]), ("memória", &[12]),
    ("cafuné", &[13]), ("defunto", &[13]), ("morte", &[13]), ("faca", &[13]), ("muro", &[13]), ("óculos", &[13]), ("enterro", &[13]),
    ("medo", &[14]), ("nuvem", &[14]), ("sal", &[14]), ("vermelho", &[14]), ("susto", &[14]), ("grito", &[14]), ("aranha", &[14]),
    ("ilha", &[15]), ("umbigo", &[15]), ("água", &[15]), ("pantano", &[15]), ("lagoa", &[15]),
    ("acidente", &[16]), ("máscara", &[16]), ("pé", &[16]), ("coroa", &[16]), ("poder", &[16]),
    ("pedra preciosa", &[17]), ("jóia", &[17]), ("diamante", &[17]), ("roubo", &[17]), ("ladrão", &[17]), ("banana", &[17]),
    ("casamento", &[18, 1]), ("lago", &[18]), ("mãe", &[18]), ("lama", &[18]), ("comida", &[18]), ("festa", &[18]),
    ("casa", &[19]), ("fogo", &[19]), ("ninho", &[19]), ("pão", &[19]), ("rio", &[19, 15]), ("beleza", &[19]), ("vaidade", &[19]),
    ("dinheiro", &[20, 7]), ("flor", &[20, 4]), ("neve", &[20]), ("olhos", &[20]), ("remédio", &[20]), ("farmácia", &[20]),
    ("carnaval", &[21]), ("filhos", &[21]), ("relógio", &[21]), ("tempo", &[21]), ("hora", &[21]),
    ("fantasma", &[22]), ("navio", &[22]), ("orelha", &[22]), ("praia", &[22]), ("rei", &[22, 16]), ("barco", &[22]),
    ("adultério", &[23]), ("naufrágio", &[23]), ("pai", &[23]), ("queda", &[23]), ("vulcão", &[23]), ("cair", &[23]), ("traição", &[23, 9]),
    ("exército", &[24]), ("hospital", &[24]), ("nascimento", &[24]), ("quartel", &[24]), ("soldado", &[24]), ("médico", &[24]),
    ("espelho", &[25]), ("estrela", &[25]), ("onda", &[25]), ("quadro", &[25]), ("leite", &[25, 11]), ("fazenda", &[25, 21]),
];

/// Au plus 5 interprétations par rêve, 3 nombres tirés.
const MAX_MATCHES: usize = 5;
const MAX_NUMBERS: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DreamMatch {
    /// Entrée de la table retenue.
    pub word: &'static str,
    /// Mot du texte qui l'a déclenchée (replié, sans accents).
    pub trigger: String,
    pub group: Group,
    pub meaning: &'static str,
    pub occurrences: usize,
}

/// Minuscules sans diacritiques.
pub fn fold(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            other => other,
        })
        .collect()
}

fn tokens(text: &str) -> Vec<String> {
    fold(text)
        .split(|c: char| !c.is_alphanumeric() && c != '-')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Occurrences d'un mot-clé (éventuellement composé) comme suite de mots entiers.
/// Le dernier mot accepte un pluriel en -s.
fn occurrences(tokens: &[String], keyword: &str) -> usize {
    let parts: Vec<String> = fold(keyword).split_whitespace().map(str::to_string).collect();
    let Some((last, head)) = parts.split_last() else {
        return 0;
    };
    let plural = format!("{last}s");
    tokens
        .windows(parts.len())
        .filter(|w| {
            w[..head.len()] == *head && (w[head.len()] == *last || w[head.len()] == plural)
        })
        .count()
}

fn entry_for(word: &str) -> Option<(&'static str, Group, &'static str)> {
    SAO_CIPRIANO
        .iter()
        .find(|(w, _, _)| *w == word)
        .and_then(|&(w, g, meaning)| Group::new(g).ok().map(|group| (w, group, meaning)))
}

/// Interprète un récit de rêve : mots de la table puis synonymes, un seul résultat par groupe,
/// triés par nombre d'occurrences.
pub fn interpret_dream(text: &str) -> Vec<DreamMatch> {
    let tokens = tokens(text);
    let mut seen = BTreeSet::new();
    let mut found = Vec::new();

    for &(word, g, meaning) in SAO_CIPRIANO {
        let count = occurrences(&tokens, word);
        let Ok(group) = Group::new(g) else { continue };
        if count > 0 && seen.insert(group) {
            found.push(DreamMatch { word, trigger: fold(word), group, meaning, occurrences: count });
        }
    }

    for (key, related) in RELATED_WORDS {
        for synonym in related.iter() {
            let count = occurrences(&tokens, synonym);
            if count == 0 {
                continue;
            }
            if let Some((word, group, meaning)) = entry_for(key)
                && seen.insert(group)
            {
                found.push(DreamMatch { word, trigger: fold(synonym), group, meaning, occurrences: count });
            }
        }
    }

    found.sort_by(|a, b| b.occurrences.cmp(&a.occurrences));
    found.truncate(MAX_MATCHES);
    found
}

/// Un nombre par interprétation (3 au plus) : une dezena du groupe tirée au hasard,
/// précédée de chiffres aléatoires jusqu'à la largeur demandée.
pub fn dream_numbers(matches: &[DreamMatch], width: DigitWidth, rng: &mut dyn RandomSource) -> Vec<String> {
    matches
        .iter()
        .take(MAX_NUMBERS)
        .map(|m| {
            let dezenas = m.group.dezenas();
            let dezena = &dezenas[pick_index(rng, dezenas.len())];
            match width {
                DigitWidth::Two => dezena.clone(),
                DigitWidth::Three => format!("{}{}", pick_index(rng, 10), dezena),
                DigitWidth::Four => format!("{:02}{}", pick_index(rng, 100), dezena),
            }
        })
        .collect()
}

fn prefix3(word: &str) -> String {
    word.chars().take(3).collect()
}

/// Groupes du dictionnaire des rêves pour un terme de recherche.
/// Mot entier ou début de mot d'abord ; sinon rapprochement sur les trois premières lettres.
pub fn lookup_dream_groups(term: &str) -> Vec<Group> {
    let folded = fold(term.trim());
    let tokens = tokens(&folded);
    if tokens.is_empty() {
        return Vec::new();
    }

    let mut groups = BTreeSet::new();
    for (word, gs) in DREAM_DICTIONARY {
        let word = fold(word);
        if occurrences(&tokens, &word) > 0 || (folded.chars().count() >= 3 && word.starts_with(&folded)) {
            groups.extend(gs.iter().filter_map(|&g| Group::new(g).ok()));
        }
    }

    if groups.is_empty() {
        for (word, gs) in DREAM_DICTIONARY {
            let word = fold(word);
            let close = tokens
                .iter()
                .filter(|t| t.chars().count() >= 3)
                .any(|t| word.starts_with(t.as_str()) || t.starts_with(&prefix3(&word)));
            if close {
                groups.extend(gs.iter().filter_map(|&g| Group::new(g).ok()));
            }
        }
    }
    groups.into_iter().collect()
}
