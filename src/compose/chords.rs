//! Chord symbols to triad frequencies.
//!
//! Lookup is total: a symbol from the voicing table gets its fixed voicing,
//! anything else is parsed for a root letter and quality, and whatever
//! cannot be parsed at all plays C major.

/// Tuning reference, A4 in Hz.
pub const A4_HZ: f64 = 440.0;

/// Closed vocabulary of voiced triads (root, third, fifth), kept between
/// F3 and B4 so progressions move by small steps.
const VOICINGS: &[(&str, [&str; 3])] = &[
    ("C", ["C4", "E4", "G4"]),
    ("Cm", ["C4", "Eb4", "G4"]),
    ("C#", ["C#4", "F4", "G#4"]),
    ("C#m", ["C#4", "E4", "G#4"]),
    ("Db", ["Db4", "F4", "Ab4"]),
    ("D", ["D4", "F#4", "A4"]),
    ("Dm", ["D4", "F4", "A4"]),
    ("Eb", ["Eb4", "G4", "Bb4"]),
    ("Ebm", ["Eb4", "Gb4", "Bb4"]),
    ("E", ["E4", "G#4", "B4"]),
    ("Em", ["E4", "G4", "B4"]),
    ("F", ["F3", "A3", "C4"]),
    ("Fm", ["F3", "Ab3", "C4"]),
    ("F#", ["F#3", "A#3", "C#4"]),
    ("F#m", ["F#3", "A3", "C#4"]),
    ("G", ["G3", "B3", "D4"]),
    ("Gm", ["G3", "Bb3", "D4"]),
    ("Ab", ["Ab3", "C4", "Eb4"]),
    ("A", ["A3", "C#4", "E4"]),
    ("Am", ["A3", "C4", "E4"]),
    ("Bb", ["Bb3", "D4", "F4"]),
    ("Bbm", ["Bb3", "Db4", "F4"]),
    ("B", ["B3", "D#4", "F#4"]),
    ("Bm", ["B3", "D4", "F#4"]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quality {
    Major,
    Minor,
    Diminished,
    Augmented,
}

impl Quality {
    /// Semitones above the root for the third and the fifth.
    fn intervals(self) -> (i32, i32) {
        match self {
            Quality::Major => (4, 7),
            Quality::Minor => (3, 7),
            Quality::Diminished => (3, 6),
            Quality::Augmented => (4, 8),
        }
    }

    fn parse(suffix: &str) -> Quality {
        let s = suffix.to_ascii_lowercase();
        if s.starts_with("dim") || s.starts_with('°') {
            Quality::Diminished
        } else if s.starts_with("aug") || s.starts_with('+') {
            Quality::Augmented
        } else if s.starts_with("maj") {
            Quality::Major
        } else if s.starts_with('m') || s.starts_with('-') {
            Quality::Minor
        } else {
            Quality::Major
        }
    }
}

/// Parse a note name into a MIDI note number.
///
/// Supports: C4, C#4, Db4, A-1, etc. C4 = 60.
pub fn note_to_midi(note: &str) -> Option<i32> {
    let bytes = note.as_bytes();
    let (&name, rest) = bytes.split_first()?;

    let mut semitone = pitch_class(name as char)?;
    let mut idx = 1;
    match rest.first() {
        Some(b'#') => {
            semitone += 1;
            idx += 1;
        }
        Some(b'b') => {
            semitone -= 1;
            idx += 1;
        }
        _ => {}
    }

    let octave: i32 = note[idx..].parse().ok()?;
    Some((octave + 1) * 12 + semitone)
}

/// `tuning_pitch · 2^((midi - 69) / 12)`
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * 2.0_f64.powf((midi as f64 - 69.0) / 12.0)
}

fn pitch_class(letter: char) -> Option<i32> {
    match letter {
        'C' => Some(0),
        'D' => Some(2),
        'E' => Some(4),
        'F' => Some(5),
        'G' => Some(7),
        'A' => Some(9),
        'B' => Some(11),
        _ => None,
    }
}

fn voiced(notes: &[&str; 3]) -> Option<[f64; 3]> {
    let mut out = [0.0; 3];
    for (slot, note) in out.iter_mut().zip(notes) {
        *slot = midi_to_frequency(note_to_midi(note)?, A4_HZ);
    }
    Some(out)
}

/// Build a triad from a root pitch class in the same register as the table.
fn triad(pitch_class: i32, quality: Quality) -> [f64; 3] {
    let pc = pitch_class.rem_euclid(12);
    let root = if pc >= 5 { 48 + pc } else { 60 + pc };
    let (third, fifth) = quality.intervals();
    [root, root + third, root + fifth].map(|m| midi_to_frequency(m, A4_HZ))
}

/// Root letter, optional accidental and quality suffix, e.g. "F#m7" or "bb".
fn parse_symbol(symbol: &str) -> Option<[f64; 3]> {
    let mut chars = symbol.chars();
    let letter = chars.next()?.to_ascii_uppercase();
    let mut pc = pitch_class(letter)?;
    let rest = chars.as_str();
    let suffix = if let Some(s) = rest.strip_prefix('#') {
        pc += 1;
        s
    } else if let Some(s) = rest.strip_prefix('b') {
        pc -= 1;
        s
    } else {
        rest
    };
    Some(triad(pc, Quality::parse(suffix)))
}

/// Triad frequencies (Hz) for a chord symbol. Never fails; every value is
/// positive and finite.
pub fn chord_frequencies(symbol: &str) -> [f64; 3] {
    let symbol = symbol.trim();
    VOICINGS
        .iter()
        .find(|(name, _)| *name == symbol)
        .and_then(|(_, notes)| voiced(notes))
        .or_else(|| parse_symbol(symbol))
        .unwrap_or_else(|| triad(0, Quality::Major))
}
