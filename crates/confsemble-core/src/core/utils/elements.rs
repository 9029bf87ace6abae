use phf::{Map, phf_map};

#[rustfmt::skip]
pub static ATOMIC_MASSES: Map<&'static str, f64> = phf_map! {
    "H"  => 1.008,   "D"  => 2.014,
    "HE" => 4.0026,  "LI" => 6.94,    "BE" => 9.0122,  "B"  => 10.81,
    "C"  => 12.011,  "N"  => 14.007,  "O"  => 15.999,  "F"  => 18.998,
    "NE" => 20.180,  "NA" => 22.990,  "MG" => 24.305,  "AL" => 26.982,
    "SI" => 28.085,  "P"  => 30.974,  "S"  => 32.06,   "CL" => 35.45,
    "AR" => 39.948,  "K"  => 39.098,  "CA" => 40.078,  "MN" => 54.938,
    "FE" => 55.845,  "CO" => 58.933,  "NI" => 58.693,  "CU" => 63.546,
    "ZN" => 65.38,   "SE" => 78.971,  "BR" => 79.904,  "I"  => 126.90,
    "CD" => 112.41,  "HG" => 200.59,
};

/// Looks up the atomic mass (in Daltons) of an element symbol, case-insensitively.
pub fn atomic_mass(element: &str) -> Option<f64> {
    let key = element.trim().to_ascii_uppercase();
    ATOMIC_MASSES.get(key.as_str()).copied()
}

/// Guesses the element symbol of an atom from its PDB-style name.
///
/// Leading digits are skipped (e.g. `1HB` is a hydrogen). Two-letter
/// elements are only recognized for hetero atoms, since protein atom names
/// such as `CA` or `HG1` denote carbon alpha and hydrogen.
pub fn infer_element(atom_name: &str, is_hetero: bool) -> Option<String> {
    let letters: String = atom_name
        .trim()
        .chars()
        .skip_while(|c| c.is_ascii_digit())
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    if letters.is_empty() {
        return None;
    }

    if is_hetero && letters.len() >= 2 {
        let two = &letters[..2];
        if ATOMIC_MASSES.contains_key(two) {
            return Some(two.to_string());
        }
    }

    let one = &letters[..1];
    ATOMIC_MASSES.contains_key(one).then(|| one.to_string())
}
