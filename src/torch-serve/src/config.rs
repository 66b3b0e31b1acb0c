//! Process-start configuration.

use std::env;
use std::path::PathBuf;

use crate::artifact::ModelUri;
use crate::error::{Result, ServeError};
use crate::preprocess::Interpolation;

/// Environment variable holding the `s3://bucket/key` of the model archive.
pub const MODEL_URI_VAR: &str = "MODEL_S3_URI";

/// Optional environment variable overriding the number of labels returned.
pub const TOP_K_VAR: &str = "TOP_K";

/// Optional boolean environment variable enabling the antialiased resize.
pub const RESIZE_ANTIALIAS_VAR: &str = "RESIZE_ANTIALIAS";

pub const DEFAULT_TOP_K: usize = 6;
pub const SCRATCH_DIR: &str = "/tmp";
pub const ARCHIVE_FILE: &str = "model.tar.gz";
pub const MODEL_FILE: &str = "model.scripted.pt";
pub const LABEL_MAPPING_FILE: &str = "index_to_name.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// Location of the compressed model archive
    pub model_uri: ModelUri,

    /// Where the archive is downloaded to
    pub archive_path: PathBuf,

    /// Directory the archive is extracted into
    pub extract_dir: PathBuf,

    /// Serialized TorchScript module inside `extract_dir`
    pub model_path: PathBuf,

    /// Label mapping, read from the working directory
    pub label_mapping_path: PathBuf,

    /// Number of labels returned per image
    pub top_k: usize,

    /// Resize filter of the preprocessing step
    pub interpolation: Interpolation,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let uri = lookup(MODEL_URI_VAR)
            .ok_or_else(|| ServeError::config(format!("{} is not set", MODEL_URI_VAR)))?;
        let model_uri = ModelUri::parse(&uri)?;

        let top_k = match lookup(TOP_K_VAR) {
            None => DEFAULT_TOP_K,
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(k) if k > 0 => k,
                _ => {
                    return Err(ServeError::config(format!(
                        "{} must be a positive integer, got '{}'",
                        TOP_K_VAR, raw
                    )))
                }
            },
        };

        let interpolation = match lookup(RESIZE_ANTIALIAS_VAR).as_deref().map(str::trim) {
            None | Some("") | Some("0") | Some("false") => Interpolation::Bilinear,
            Some("1") | Some("true") => Interpolation::BilinearAntialias,
            Some(other) => {
                return Err(ServeError::config(format!(
                    "{} must be one of 1, 0, true, false, got '{}'",
                    RESIZE_ANTIALIAS_VAR, other
                )))
            }
        };

        let scratch = PathBuf::from(SCRATCH_DIR);

        Ok(Config {
            model_uri,
            archive_path: scratch.join(ARCHIVE_FILE),
            model_path: scratch.join(MODEL_FILE),
            extract_dir: scratch,
            label_mapping_path: PathBuf::from(LABEL_MAPPING_FILE),
            top_k,
            interpolation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn missing_model_uri_is_fatal() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ServeError::Config(_)));
        assert!(err.to_string().contains(MODEL_URI_VAR));
    }

    #[test]
    fn defaults_follow_the_lambda_layout() {
        let config =
            Config::from_lookup(lookup(&[(MODEL_URI_VAR, "s3://models/resnet/model.tar.gz")]))
                .unwrap();

        assert_eq!(config.model_uri.bucket(), "models");
        assert_eq!(config.model_uri.key(), "resnet/model.tar.gz");
        assert_eq!(config.archive_path, PathBuf::from("/tmp/model.tar.gz"));
        assert_eq!(config.extract_dir, PathBuf::from("/tmp"));
        assert_eq!(config.model_path, PathBuf::from("/tmp/model.scripted.pt"));
        assert_eq!(config.label_mapping_path, PathBuf::from("index_to_name.json"));
        assert_eq!(config.top_k, 6);
        assert_eq!(config.interpolation, Interpolation::Bilinear);
    }

    #[test]
    fn antialiasing_is_opt_in() {
        let uri = (MODEL_URI_VAR, "s3://models/model.tar.gz");

        for (raw, expected) in [
            ("1", Interpolation::BilinearAntialias),
            ("true", Interpolation::BilinearAntialias),
            ("0", Interpolation::Bilinear),
            ("false", Interpolation::Bilinear),
        ] {
            let config = Config::from_lookup(lookup(&[uri, (RESIZE_ANTIALIAS_VAR, raw)])).unwrap();
            assert_eq!(config.interpolation, expected, "for '{}'", raw);
        }

        let err = Config::from_lookup(lookup(&[uri, (RESIZE_ANTIALIAS_VAR, "maybe")])).unwrap_err();
        assert!(matches!(err, ServeError::Config(_)));
    }

    #[test]
    fn top_k_can_be_overridden() {
        let config = Config::from_lookup(lookup(&[
            (MODEL_URI_VAR, "s3://models/model.tar.gz"),
            (TOP_K_VAR, "3"),
        ]))
        .unwrap();
        assert_eq!(config.top_k, 3);

        for bad in ["0", "-1", "six"] {
            let err = Config::from_lookup(lookup(&[
                (MODEL_URI_VAR, "s3://models/model.tar.gz"),
                (TOP_K_VAR, bad),
            ]))
            .unwrap_err();
            assert!(matches!(err, ServeError::Config(_)), "accepted {}", bad);
        }
    }

    #[test]
    fn unparseable_model_uri_is_fatal() {
        let err = Config::from_lookup(lookup(&[(MODEL_URI_VAR, "s3://bucket-only")])).unwrap_err();
        assert!(matches!(err, ServeError::InvalidUri { .. }));
    }
}
