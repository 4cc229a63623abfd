use std::collections::HashSet;

/// Nickname fragments and the canonical club name they stand for, so that
/// "Man Utd", "Manchester United FC" and friends compare equal. Checked in
/// order against the normalised name; the first fragment contained wins.
const ALIASES: &[(&str, &str)] = &[
    ("wolves", "wolverhampton wanderers"),
    ("wolverhampton", "wolverhampton wanderers"),
    ("spurs", "tottenham hotspur"),
    ("man city", "manchester city"),
    ("man utd", "manchester united"),
    ("man united", "manchester united"),
    ("notts forest", "nottingham forest"),
    ("nottm forest", "nottingham forest"),
    ("forest", "nottingham forest"),
    ("newcastle", "newcastle united"),
];

/// Lowercase, `&` to `and`, drop `fc`/`afc`, expand `utd`, collapse
/// punctuation to single spaces.
pub fn normalize(name: &str) -> String {
    let lowered = name.to_lowercase().replace('&', " and ");
    lowered
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .filter(|t| *t != "fc" && *t != "afc")
        .map(|t| if t == "utd" { "united" } else { t })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn canonical(name: &str) -> String {
    let n = normalize(name);
    ALIASES
        .iter()
        .find(|(fragment, _)| n.contains(fragment))
        .map(|(_, full)| (*full).to_string())
        .unwrap_or(n)
}

fn tokens(name: &str) -> HashSet<String> {
    canonical(name)
        .split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// At least one shared word between two team names. Empty names never match.
pub fn team_matches(ours: &str, theirs: &str) -> bool {
    let a = tokens(ours);
    let b = tokens(theirs);
    !a.is_empty() && a.intersection(&b).next().is_some()
}

/// Both sides match, home against home and away against away.
pub fn fixture_matches(our_home: &str, our_away: &str, their_home: &str, their_away: &str) -> bool {
    team_matches(our_home, their_home) && team_matches(our_away, their_away)
}
