//! Heuristic assignment of event block lines to event fields.
//!
//! Nothing in a Celcat block is labelled, so fields are recognised from their
//! shape. The rules below run once, left to right, each one scanning forward
//! from a shared cursor for the first line it can claim. A claim moves the
//! cursor past that line; a rule that finds nothing leaves the cursor alone.
//! Whatever is left after the last rule is offered to the group collector.

const LOCATION_KEYWORDS: &[&str] = &[
    "Amphi",
    "Salle",
    "Room",
    "Porte",
    "Door",
    "TD -",
    "TP -",
    "Espace",
    "e-learning",
    "Distance learning",
    "Labo",
    "Lab",
];

const TEACHER_EXCLUSIONS: &[&str] = &[
    "CM",
    "TD",
    "TP",
    "VET",
    "Master",
    "Examen",
    "Evaluation",
    "Group",
    "Groupe",
];

const SESSION_TYPES: &[&str] = &[
    "CM",
    "TD",
    "TP",
    "Examen",
    "Evaluation",
    "Oral",
    "Conférence",
    "Contrôle",
    "Lecture",
    "Tutorial",
    "Exam",
];

// Matched against the lowercased line.
const GROUP_MARKERS: &[&str] = &["vet", "master", "group", "class", "promo"];

type Claim = fn(&str, &mut Fields) -> bool;

const RULES: &[(&str, Claim)] = &[
    ("title", claim_title),
    ("course", claim_course),
    ("location", claim_location),
    ("teacher", claim_teacher),
    ("type", claim_kind),
];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub title: String,
    pub course_code: String,
    pub course_name: String,
    pub location: String,
    pub teacher: String,
    pub kind: String,
    pub groups: Vec<String>,
}

/// Classifies the lines of one event block. Returns `None` when there is
/// nothing that could serve as a title.
pub fn classify<I>(tokens: I) -> Option<Fields>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let tokens = tokens.into_iter().collect::<Vec<_>>();
    let mut fields = Fields::default();
    let mut cursor = 0;

    for (name, claim) in RULES {
        match tokens[cursor..]
            .iter()
            .position(|token| claim(token.as_ref(), &mut fields))
        {
            Some(offset) => cursor += offset + 1,
            None => log::trace!("no {name} line after position {cursor}"),
        }
    }

    if fields.title.is_empty() {
        return None;
    }

    for token in &tokens[cursor..] {
        collect_group(token.as_ref(), &mut fields.groups);
    }

    Some(fields)
}

fn claim_title(token: &str, fields: &mut Fields) -> bool {
    if crate::is_time_token(token) {
        return false;
    }

    fields.title = token.to_string();
    true
}

fn claim_course(token: &str, fields: &mut Fields) -> bool {
    let Some((code, name)) = split_course(token) else {
        return false;
    };

    fields.course_code = code.to_string();
    fields.course_name = strip_annotation(name).to_string();
    true
}

fn claim_location(token: &str, fields: &mut Fields) -> bool {
    let is_place = LOCATION_KEYWORDS.iter().any(|keyword| token.contains(keyword));
    let is_course = split_course(token).is_some() && token.contains('[');

    if !is_place || is_course {
        return false;
    }

    fields.location = token.to_string();
    true
}

fn claim_teacher(token: &str, fields: &mut Fields) -> bool {
    let is_name = regex!(r"^\p{Lu}\p{Ll}+(?:[-']\p{Lu}?\p{Ll}+)*\s+\p{Lu}\p{Ll}+").is_match(token);
    let is_excluded = TEACHER_EXCLUSIONS.iter().any(|word| token.contains(word));

    if !is_name || is_excluded {
        return false;
    }

    fields.teacher = token.to_string();
    true
}

fn claim_kind(token: &str, fields: &mut Fields) -> bool {
    let Some(kind) = SESSION_TYPES.iter().find(|kind| **kind == token) else {
        return false;
    };

    fields.kind = kind.to_string();
    true
}

fn collect_group(token: &str, groups: &mut Vec<String>) {
    let lowercase = token.to_lowercase();
    let is_group =
        token.contains('[') || GROUP_MARKERS.iter().any(|marker| lowercase.contains(marker));

    if !is_group {
        return;
    }

    let group = strip_annotation(token);
    if !group.is_empty() && !groups.iter().any(|existing| existing == group) {
        groups.push(group.to_string());
    }
}

/// Splits `062 Integrated physiopathology` into code and name. Codes are 2-4
/// alphanumerics containing at least one digit.
fn split_course(token: &str) -> Option<(&str, &str)> {
    let captures = regex!(r"^([A-Za-z0-9]{2,4})\s+(.+)$").captures(token)?;
    let code = captures.get(1)?.as_str();

    code.bytes()
        .any(|byte| byte.is_ascii_digit())
        .then(|| (code, captures.get(2).map_or("", |name| name.as_str())))
}

/// `VET3-classe 5 [VET3-classe 5]` -> `VET3-classe 5`
fn strip_annotation(text: &str) -> &str {
    text.split('[').next().unwrap_or_default().trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_a_complete_block() {
        let fields = classify([
            "TD1 Physiology",
            "062 Integrated physiopathology",
            "Room G5",
            "Doe Jane",
            "TD",
            "Group3",
        ])
        .unwrap();

        assert_eq!(
            fields,
            Fields {
                title: "TD1 Physiology".into(),
                course_code: "062".into(),
                course_name: "Integrated physiopathology".into(),
                location: "Room G5".into(),
                teacher: "Doe Jane".into(),
                kind: "TD".into(),
                groups: vec!["Group3".into()],
            }
        );
    }

    #[test]
    fn empty_sequence_yields_nothing() {
        assert_eq!(classify(Vec::<String>::new()), None);
    }

    #[test]
    fn title_skips_a_leading_time() {
        let fields = classify(["08:30", "Anatomy"]).unwrap();
        assert_eq!(fields.title, "Anatomy");
    }

    #[test]
    fn strips_annotations_from_course_names() {
        let fields = classify(["Anatomy", "0610 Techniques [0610 Techniques]"]).unwrap();

        assert_eq!(fields.course_code, "0610");
        assert_eq!(fields.course_name, "Techniques");
    }

    #[test]
    fn missing_course_does_not_consume_lines() {
        let fields = classify(["Anatomy", "Amphi A", "Mignot Grégoire", "CM"]).unwrap();

        assert_eq!(fields.course_code, "");
        assert_eq!(fields.course_name, "");
        assert_eq!(fields.location, "Amphi A");
        assert_eq!(fields.teacher, "Mignot Grégoire");
        assert_eq!(fields.kind, "CM");
    }

    #[test]
    fn later_rules_never_see_claimed_or_skipped_lines() {
        // The teacher line precedes the location, so the location scan skips
        // past it and the teacher rule starts after the room.
        let fields = classify(["Anatomy", "Doe Jane", "Salle 12", "TP"]).unwrap();

        assert_eq!(fields.location, "Salle 12");
        assert_eq!(fields.teacher, "");
        assert_eq!(fields.kind, "TP");
    }

    #[test]
    fn location_rejects_annotated_course_lines() {
        let fields = classify([
            "Practical",
            "062 Sémiologie [062 Sémiologie]",
            "065 Labo [065 Labo]",
            "220 TD - Porte n° 220",
        ])
        .unwrap();

        assert_eq!(fields.course_code, "062");
        assert_eq!(fields.location, "220 TD - Porte n° 220");
    }

    #[test]
    fn teacher_excludes_session_and_group_words() {
        let fields = classify(["Anatomy", "Master Biology", "Hernandez-Rodriguez Juan"]).unwrap();
        assert_eq!(fields.teacher, "Hernandez-Rodriguez Juan");

        let fields = classify(["Anatomy", "Group Alpha"]).unwrap();
        assert_eq!(fields.teacher, "");
    }

    #[test]
    fn teacher_needs_two_capitalised_words() {
        for name in ["Doe Jane", "Mignot Grégoire", "Jean-Pierre Martin"] {
            assert_eq!(classify(["Anatomy", name]).unwrap().teacher, name);
        }

        for line in ["PHYSIO Respiratoire", "Anatomy lecture", "Amphi B", "doe Jane"] {
            assert_eq!(classify(["Anatomy", line]).unwrap().teacher, "", "{line}");
        }
    }

    #[test]
    fn type_requires_exact_vocabulary_match() {
        let fields = classify(["Anatomy", "TD groupe", "Examen"]).unwrap();
        assert_eq!(fields.kind, "Examen");
    }

    #[test]
    fn groups_are_cleaned_and_deduplicated() {
        let fields = classify([
            "Anatomy",
            "CM",
            "VET3-classe 5 [VET3-classe 5]",
            "Unrelated note",
            "VET3-classe 5",
            "VET3-classe 6 [VET3-classe 6]",
            "[only annotation]",
        ])
        .unwrap();

        assert_eq!(fields.groups, ["VET3-classe 5", "VET3-classe 6"]);
    }
}
