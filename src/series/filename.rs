//! Storage format detection and file-based name matching.

use crate::io::Format;

use super::ITERATION_PLACEHOLDER;

/// Storage format implied by the extension of `filename`
///
/// `.bp` maps to ADIOS1; see [`determine_format_with`] to pick another
/// engine. Unknown extensions yield [`Format::Dummy`].
pub fn determine_format(filename: &str) -> Format {
    determine_format_with(filename, Format::Adios1)
}

/// Like [`determine_format`], with `.bp` mapped to `bp_engine`
pub fn determine_format_with(filename: &str, bp_engine: Format) -> Format {
    if filename.ends_with(".h5") {
        return Format::Hdf5;
    }
    if filename.ends_with(".bp") {
        return bp_engine;
    }
    if filename.ends_with(".json") {
        return Format::Json;
    }
    if filename.contains('.') {
        log::warn!(
            "Unknown storage format for '{}'. Did you append a correct filename extension? \
             Your IO operations will be NOOPS!",
            filename
        );
    }
    Format::Dummy
}

/// `filename` without the extension belonging to `format`
pub fn clean_filename(filename: &str, format: Format) -> String {
    format
        .extension()
        .and_then(|ext| filename.strip_suffix(ext))
        .unwrap_or(filename)
        .to_string()
}

/// Predicate selecting the files of one file-based series
///
/// A name `run%T` with format HDF5 accepts `run0.h5` and `run100.h5`: the
/// placeholder stands for one or more decimal digits and the whole file name
/// must match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilenamePattern {
    prefix: String,
    suffix: String,
    placeholder: bool,
    matches_nothing: bool,
}

impl FilenamePattern {
    /// Whether `filename` belongs to the series
    pub fn matches(&self, filename: &str) -> bool {
        if self.matches_nothing {
            return false;
        }
        if !self.placeholder {
            return filename.len() == self.prefix.len() + self.suffix.len()
                && filename.starts_with(&self.prefix)
                && filename.ends_with(&self.suffix);
        }
        self.digits(filename).is_some()
    }

    /// Iteration index encoded in a matching `filename`
    pub fn iteration_of(&self, filename: &str) -> Option<u64> {
        if self.matches_nothing || !self.placeholder {
            return None;
        }
        self.digits(filename)?.parse().ok()
    }

    fn digits<'a>(&self, filename: &'a str) -> Option<&'a str> {
        let digits = filename
            .strip_prefix(self.prefix.as_str())?
            .strip_suffix(self.suffix.as_str())?;
        (!digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())).then_some(digits)
    }
}

/// Build the [`FilenamePattern`] of the series `name` stored as `format`
///
/// Only the last placeholder in `name` is substituted. Formats without a file
/// extension match nothing.
pub fn matcher(name: &str, format: Format) -> FilenamePattern {
    let Some(extension) = format.extension() else {
        return FilenamePattern {
            prefix: String::new(),
            suffix: String::new(),
            placeholder: false,
            matches_nothing: true,
        };
    };
    match name.rsplit_once(ITERATION_PLACEHOLDER) {
        Some((prefix, rest)) => FilenamePattern {
            prefix: prefix.to_string(),
            suffix: format!("{}{}", rest, extension),
            placeholder: true,
            matches_nothing: false,
        },
        None => FilenamePattern {
            prefix: name.to_string(),
            suffix: extension.to_string(),
            placeholder: false,
            matches_nothing: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_determine_format() {
        assert_eq!(determine_format("data%T.h5"), Format::Hdf5);
        assert_eq!(determine_format("data.bp"), Format::Adios1);
        assert_eq!(determine_format_with("data.bp", Format::Adios2), Format::Adios2);
        assert_eq!(determine_format("data.json"), Format::Json);
        assert_eq!(determine_format("data.txt"), Format::Dummy);
        assert_eq!(determine_format("data"), Format::Dummy);
    }

    #[test]
    fn test_clean_filename() {
        assert_eq!(clean_filename("data%T.h5", Format::Hdf5), "data%T");
        assert_eq!(clean_filename("data.bp", Format::Adios2), "data");
        assert_eq!(clean_filename("data.h5", Format::Adios1), "data.h5");
        assert_eq!(clean_filename("data.txt", Format::Dummy), "data.txt");
    }

    #[test]
    fn test_matcher_file_based() {
        let pattern = matcher("run%T", Format::Hdf5);
        assert!(pattern.matches("run0.h5"));
        assert!(pattern.matches("run10.h5"));
        assert!(!pattern.matches("run.h5"));
        assert!(!pattern.matches("runx.h5"));
        assert!(!pattern.matches("run1.bp"));
        assert!(!pattern.matches("xrun1.h5"));
        assert!(!pattern.matches("run1.h5.bak"));
        assert_eq!(pattern.iteration_of("run10.h5"), Some(10));
        assert_eq!(pattern.iteration_of("run.h5"), None);
    }

    #[test]
    fn test_matcher_index_overflow() {
        let pattern = matcher("run%T", Format::Hdf5);
        let file = "run99999999999999999999999.h5";
        assert!(pattern.matches(file));
        assert_eq!(pattern.iteration_of(file), None);
        assert_eq!(
            pattern.iteration_of("run18446744073709551615.h5"),
            Some(u64::MAX)
        );
    }

    #[test]
    fn test_matcher_placeholder_inside_name() {
        let pattern = matcher("sim_%T_fields", Format::Json);
        assert!(pattern.matches("sim_42_fields.json"));
        assert!(!pattern.matches("sim__fields.json"));
        assert_eq!(pattern.iteration_of("sim_007_fields.json"), Some(7));
    }

    #[test]
    fn test_matcher_without_placeholder_or_extension() {
        let pattern = matcher("single", Format::Hdf5);
        assert!(pattern.matches("single.h5"));
        assert!(!pattern.matches("single0.h5"));
        assert_eq!(pattern.iteration_of("single.h5"), None);

        assert!(!matcher("run%T", Format::Dummy).matches("run1"));
    }

    fn formats() -> impl Strategy<Value = Format> {
        prop_oneof![
            Just(Format::Hdf5),
            Just(Format::Adios1),
            Just(Format::Json),
        ]
    }

    proptest! {
        #[test]
        fn prop_extension_round_trip(name in "[a-zA-Z0-9_%.]{0,16}", format in formats()) {
            let extension = format.extension().unwrap_or_default();
            let file = format!("{}{}", clean_filename(&name, format), extension);
            prop_assert_eq!(determine_format(&file), format);
        }

        #[test]
        fn prop_matcher_accepts_digits(
            prefix in "[a-z_]{0,8}",
            suffix in "[a-z_]{0,8}",
            index in any::<u32>(),
            format in formats(),
        ) {
            let pattern = matcher(&format!("{}%T{}", prefix, suffix), format);
            let extension = format.extension().unwrap_or_default();
            let file = format!("{}{}{}{}", prefix, index, suffix, extension);
            prop_assert!(pattern.matches(&file));
            prop_assert_eq!(pattern.iteration_of(&file), Some(u64::from(index)));
        }

        #[test]
        fn prop_matcher_rejects_non_digits(
            prefix in "[a-z_]{0,8}",
            filler in "[a-z_]{0,4}",
            format in formats(),
        ) {
            let pattern = matcher(&format!("{}%T", prefix), format);
            let extension = format.extension().unwrap_or_default();
            let file = format!("{}{}{}", prefix, filler, extension);
            prop_assert!(!pattern.matches(&file));
        }
    }
}
