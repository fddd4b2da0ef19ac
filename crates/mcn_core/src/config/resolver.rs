//! Three-way configuration merge.
//!
//! Every leaf is taken from the highest layer that sets it:
//! overrides, then the config document, then the defaults.

use std::path::PathBuf;

use crate::template::{TemplateError, TemplateSpec};

use super::document::ConfigLayer;
use super::settings::{Config, RecognitionSettings, RunOptions, SamplingStrategy, ToolPaths};
use super::{ConfigError, ConfigResult};

/// First `Some` from the layers, highest first.
fn pick<T: Clone>(layers: &[&ConfigLayer], get: impl Fn(&ConfigLayer) -> &Option<T>) -> Option<T> {
    layers.iter().find_map(|layer| get(layer).clone())
}

/// Template of the highest layer that sets one.
///
/// Within a layer `custom_template` beats `template`.
fn resolve_template(layers: &[&ConfigLayer]) -> ConfigResult<TemplateSpec> {
    for layer in layers {
        if let Some(custom) = &layer.custom_template {
            return Ok(TemplateSpec::Custom(custom.clone()));
        }
        if let Some(value) = &layer.template {
            return TemplateSpec::parse(value).map_err(|e| match e {
                TemplateError::UnknownPreset(name) => ConfigError::UnknownTemplate(name),
            });
        }
    }
    Ok(TemplateSpec::default())
}

fn validate(recognition: &RecognitionSettings) -> ConfigResult<()> {
    if !recognition.offset.is_finite() || recognition.offset < 0.0 {
        return Err(ConfigError::invalid(
            "recognition.offset",
            format!("must be a non-negative number, got {}", recognition.offset),
        ));
    }
    if !(0.0..=1.0).contains(&recognition.percentage) {
        return Err(ConfigError::invalid(
            "recognition.percentage",
            format!("must be between 0 and 1, got {}", recognition.percentage),
        ));
    }
    if !recognition.duration.is_finite() || recognition.duration <= 0.0 {
        return Err(ConfigError::invalid(
            "recognition.duration",
            format!("must be positive, got {}", recognition.duration),
        ));
    }
    Ok(())
}

/// Merge `overrides` over `document` over `defaults` into a [`Config`].
pub fn resolve(
    defaults: &ConfigLayer,
    document: Option<&ConfigLayer>,
    overrides: &ConfigLayer,
) -> ConfigResult<Config> {
    let layers: Vec<&ConfigLayer> = std::iter::once(overrides)
        .chain(document)
        .chain(std::iter::once(defaults))
        .collect();
    let fallback = RecognitionSettings::default();

    let strategy = match pick(&layers, |l| &l.recognition.strategy) {
        Some(name) => name.parse::<SamplingStrategy>()?,
        None => fallback.strategy,
    };

    let recognition = RecognitionSettings {
        strategy,
        offset: pick(&layers, |l| &l.recognition.offset).unwrap_or(fallback.offset),
        percentage: pick(&layers, |l| &l.recognition.percentage).unwrap_or(fallback.percentage),
        duration: pick(&layers, |l| &l.recognition.duration).unwrap_or(fallback.duration),
    };
    validate(&recognition)?;

    let tools = ToolPaths {
        ffmpeg: pick::<PathBuf>(&layers, |l| &l.tools.ffmpeg),
        mkvextract: pick(&layers, |l| &l.tools.mkvextract),
        mkvpropedit: pick(&layers, |l| &l.tools.mkvpropedit),
        recognizer: pick(&layers, |l| &l.tools.recognizer),
    };

    let options = RunOptions {
        no_backup: pick(&layers, |l| &l.options.no_backup).unwrap_or(false),
        skip_check: pick(&layers, |l| &l.options.skip_check).unwrap_or(false),
    };

    let config = Config {
        mkv_file: pick(&layers, |l| &l.mkv_file),
        output: pick(&layers, |l| &l.output),
        template: resolve_template(&layers)?,
        recognition,
        tools,
        options,
    };

    tracing::debug!(
        "Resolved config: template={}, strategy={}, offset={}s, percentage={}, duration={}s",
        config.template.label(),
        config.recognition.strategy,
        config.recognition.offset,
        config.recognition.percentage,
        config.recognition.duration
    );

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::document::{OptionsLayer, RecognitionLayer, ToolsLayer};

    fn layer_with_offset(offset: f64) -> ConfigLayer {
        ConfigLayer {
            recognition: RecognitionLayer {
                offset: Some(offset),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn defaults_only() {
        let config = resolve(&ConfigLayer::defaults(), None, &ConfigLayer::default()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn override_beats_document_beats_default() {
        let defaults = ConfigLayer::defaults();
        let document = layer_with_offset(8.0);

        let config = resolve(&defaults, Some(&document), &ConfigLayer::default()).unwrap();
        assert_eq!(config.recognition.offset, 8.0);

        let config = resolve(&defaults, Some(&document), &layer_with_offset(2.0)).unwrap();
        assert_eq!(config.recognition.offset, 2.0);

        // Untouched leaves of the same group still come from lower layers.
        assert_eq!(config.recognition.duration, 3.0);
    }

    #[test]
    fn nested_groups_merge_independently() {
        let document = ConfigLayer {
            tools: ToolsLayer {
                ffmpeg: Some(PathBuf::from("/opt/ffmpeg")),
                ..Default::default()
            },
            options: OptionsLayer {
                no_backup: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };
        let overrides = ConfigLayer {
            tools: ToolsLayer {
                mkvextract: Some(PathBuf::from("/opt/mkvextract")),
                ..Default::default()
            },
            options: OptionsLayer {
                skip_check: Some(true),
                ..Default::default()
            },
            ..Default::default()
        };

        let config = resolve(&ConfigLayer::defaults(), Some(&document), &overrides).unwrap();
        assert_eq!(config.tools.ffmpeg, Some(PathBuf::from("/opt/ffmpeg")));
        assert_eq!(config.tools.mkvextract, Some(PathBuf::from("/opt/mkvextract")));
        assert!(config.options.no_backup);
        assert!(config.options.skip_check);
    }

    #[test]
    fn custom_template_beats_preset_in_same_layer() {
        let document = ConfigLayer {
            template: Some("full".to_string()),
            custom_template: Some("{name} by {artist_first}".to_string()),
            ..Default::default()
        };
        let config = resolve(&ConfigLayer::defaults(), Some(&document), &ConfigLayer::default())
            .unwrap();
        assert_eq!(
            config.template,
            TemplateSpec::Custom("{name} by {artist_first}".to_string())
        );
    }

    #[test]
    fn higher_layer_template_beats_lower_custom_template() {
        let document = ConfigLayer {
            custom_template: Some("{name}".to_string()),
            ..Default::default()
        };
        let overrides = ConfigLayer {
            template: Some("japanese".to_string()),
            ..Default::default()
        };
        let config = resolve(&ConfigLayer::defaults(), Some(&document), &overrides).unwrap();
        assert_eq!(config.template.label(), "japanese");
    }

    #[test]
    fn command_line_template_beats_document_template() {
        let document = ConfigLayer {
            template: Some("simple".to_string()),
            ..Default::default()
        };
        let overrides = ConfigLayer {
            template: Some("full".to_string()),
            ..Default::default()
        };

        let config = resolve(&ConfigLayer::defaults(), Some(&document), &overrides).unwrap();
        assert_eq!(config.template.label(), "full");

        let config =
            resolve(&ConfigLayer::defaults(), Some(&document), &ConfigLayer::default()).unwrap();
        assert_eq!(config.template.label(), "simple");
    }

    #[test]
    fn template_with_brace_is_literal() {
        let overrides = ConfigLayer {
            template: Some("{artists}: {name}".to_string()),
            ..Default::default()
        };
        let config = resolve(&ConfigLayer::defaults(), None, &overrides).unwrap();
        assert_eq!(config.template.format_str(), "{artists}: {name}");
    }

    #[test]
    fn unknown_preset_is_rejected() {
        let overrides = ConfigLayer {
            template: Some("fancy".to_string()),
            ..Default::default()
        };
        let err = resolve(&ConfigLayer::defaults(), None, &overrides).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTemplate(ref n) if n == "fancy"));
    }

    #[test]
    fn unknown_strategy_is_rejected() {
        let document = ConfigLayer {
            recognition: RecognitionLayer {
                strategy: Some("loudest".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let err = resolve(&ConfigLayer::defaults(), Some(&document), &ConfigLayer::default())
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnknownStrategy(_)));
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let defaults = ConfigLayer::defaults();
        let bad = [
            RecognitionLayer {
                percentage: Some(1.5),
                ..Default::default()
            },
            RecognitionLayer {
                offset: Some(-1.0),
                ..Default::default()
            },
            RecognitionLayer {
                duration: Some(0.0),
                ..Default::default()
            },
        ];
        for recognition in bad {
            let overrides = ConfigLayer {
                recognition,
                ..Default::default()
            };
            assert!(matches!(
                resolve(&defaults, None, &overrides),
                Err(ConfigError::Invalid { .. })
            ));
        }
    }
}
