//! Command-line configuration
//!
//! The flag grammar is deliberately rigid and inherited from the original
//! tool: case-sensitive single-dash flags, each value-taking flag consumes
//! exactly the next raw argument, and anything unrecognized is ignored so
//! that wrapper scripts can pass extra noise through. `clap` cannot express
//! this contract (in particular the silent-ignore rule and the exact
//! missing-value diagnostics), so the scan is written by hand.

use std::path::PathBuf;

use thiserror::Error;

/// A value-taking flag was given without its value.
///
/// The caller is expected to print this on stderr and exit with status 0;
/// callers of the original tool depend on that status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{flag} option requires {value_name} argument.")]
pub struct UsageError {
    /// The flag that was missing its value, e.g. `-i`.
    pub flag: &'static str,
    /// Human name of the expected value, e.g. `image`.
    pub value_name: &'static str,
}

/// Resolved run configuration, immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Input image path (`-i`).
    pub image: PathBuf,
    /// Tesseract language code (`-l`), passed through unmodified.
    pub lang: String,
    /// Output XML path (`-o`).
    pub output: PathBuf,
    /// Optional Tesseract config file name (`-c`).
    pub config_file: Option<String>,
    /// Segmentation-mode code (`-p`), see [`crate::engine::PageSegMode::from_code`].
    pub psm: i32,
    /// Engine-mode code (`-e`), see [`crate::engine::EngineMode::from_code`].
    pub engine: i32,
    /// Print plain page text instead of writing XML (`-q`).
    pub quick_text: bool,
    /// Print plain page text *and* write XML (`-b`).
    pub both: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image: PathBuf::from("default.jpg"),
            lang: "eng".to_string(),
            output: PathBuf::from("alto.xml"),
            config_file: None,
            psm: 4,
            engine: 3,
            quick_text: false,
            both: false,
        }
    }
}

impl Config {
    /// Scan `args` (without the program name) into a `Config`, overwriting
    /// the defaults field by field.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Config, UsageError> {
        let mut config = Config::default();
        let mut iter = args.iter().map(AsRef::as_ref);

        while let Some(arg) = iter.next() {
            match arg {
                "-c" => {
                    let value = take_value(&mut iter, "-c", "config")?;
                    // An empty value means "no config file", matching the
                    // original's zero-length config list.
                    config.config_file =
                        (!value.is_empty()).then(|| value.to_string());
                }
                "-e" => {
                    config.engine = parse_code(take_value(&mut iter, "-e", "engine")?);
                }
                "-i" => {
                    config.image = PathBuf::from(take_value(&mut iter, "-i", "image")?);
                }
                "-l" => {
                    config.lang = take_value(&mut iter, "-l", "lang")?.to_string();
                }
                "-p" => {
                    config.psm = parse_code(take_value(&mut iter, "-p", "psm")?);
                }
                "-o" => {
                    config.output = PathBuf::from(take_value(&mut iter, "-o", "alto file")?);
                }
                "-q" => config.quick_text = true,
                "-b" => config.both = true,
                _ => {}
            }
        }

        Ok(config)
    }
}

fn take_value<'a>(
    iter: &mut impl Iterator<Item = &'a str>,
    flag: &'static str,
    value_name: &'static str,
) -> Result<&'a str, UsageError> {
    iter.next().ok_or(UsageError { flag, value_name })
}

/// Numeric mode codes use `atoi` semantics: anything unparseable is 0.
fn parse_code(value: &str) -> i32 {
    value.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::parse::<&str>(&[]).unwrap();
        assert_eq!(config.image, PathBuf::from("default.jpg"));
        assert_eq!(config.lang, "eng");
        assert_eq!(config.output, PathBuf::from("alto.xml"));
        assert_eq!(config.config_file, None);
        assert_eq!(config.psm, 4);
        assert_eq!(config.engine, 3);
        assert!(!config.quick_text);
        assert!(!config.both);
    }

    #[test]
    fn test_all_flags() {
        let config = Config::parse(&[
            "-c", "hocr", "-e", "1", "-i", "scan.png", "-l", "deu", "-p", "6",
            "-o", "out.xml", "-q", "-b",
        ])
        .unwrap();
        assert_eq!(config.config_file.as_deref(), Some("hocr"));
        assert_eq!(config.engine, 1);
        assert_eq!(config.image, PathBuf::from("scan.png"));
        assert_eq!(config.lang, "deu");
        assert_eq!(config.psm, 6);
        assert_eq!(config.output, PathBuf::from("out.xml"));
        assert!(config.quick_text);
        assert!(config.both);
    }

    #[test]
    fn test_missing_image_value() {
        let err = Config::parse(&["-i"]).unwrap_err();
        assert_eq!(err.to_string(), "-i option requires image argument.");
    }

    #[test]
    fn test_missing_value_messages() {
        let cases = [
            (vec!["-c"], "-c option requires config argument."),
            (vec!["-e"], "-e option requires engine argument."),
            (vec!["-l"], "-l option requires lang argument."),
            (vec!["-p"], "-p option requires psm argument."),
            (vec!["-o"], "-o option requires alto file argument."),
        ];
        for (args, message) in cases {
            let err = Config::parse(&args).unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }

    #[test]
    fn test_unrecognized_flags_ignored() {
        let config = Config::parse(&["-z", "--image", "stray", "-l", "fra"]).unwrap();
        assert_eq!(config.lang, "fra");
        assert_eq!(config.image, PathBuf::from("default.jpg"));
    }

    #[test]
    fn test_flag_lookalike_consumed_as_value() {
        // A value-taking flag eats the next argument even if it looks like
        // another flag; `-q` here is the image path, not the quick flag.
        let config = Config::parse(&["-i", "-q"]).unwrap();
        assert_eq!(config.image, PathBuf::from("-q"));
        assert!(!config.quick_text);
    }

    #[test]
    fn test_empty_config_value_means_none() {
        let config = Config::parse(&["-c", ""]).unwrap();
        assert_eq!(config.config_file, None);
    }

    #[test]
    fn test_non_numeric_codes_parse_as_zero() {
        let config = Config::parse(&["-p", "fast", "-e", "lstm"]).unwrap();
        assert_eq!(config.psm, 0);
        assert_eq!(config.engine, 0);
    }

    #[test]
    fn test_later_flag_wins() {
        let config = Config::parse(&["-l", "eng", "-l", "jpn"]).unwrap();
        assert_eq!(config.lang, "jpn");
    }
}
