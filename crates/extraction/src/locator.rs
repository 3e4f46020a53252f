//! Location resolution: locator templates and their rendering.
//!
//! Templates use a closed set of placeholders, compiled once so that an
//! unsupported placeholder is reported before any job runs:
//!
//! | Placeholder | Expansion |
//! |---|---|
//! | `{cycle}` | cycle as `%Y%m%d%H` |
//! | `{yyyymmdd}` | cycle date |
//! | `{hh}` | cycle hour |
//! | `{leadtime}` / `{leadtime:0N}` | lead-time hours, zero-padded to 3 (or N) digits |
//! | `{validtime}` | valid time as `%Y%m%d%H` |
//! | `{variable}` | variable name |

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use vx_common::TimeCoords;

use crate::error::TemplateError;

const DEFAULT_LEAD_WIDTH: usize = 3;
const MAX_LEAD_WIDTH: usize = 9;

/// A supported template placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Cycle,
    CycleDate,
    CycleHour,
    LeadHours { width: usize },
    ValidTime,
    Variable,
}

impl Placeholder {
    fn parse(inner: &str, template: &str) -> Result<Self, TemplateError> {
        let (name, width) = match inner.split_once(':') {
            Some((name, width)) => (name, Some(width)),
            None => (inner, None),
        };

        let placeholder = match name {
            "cycle" => Placeholder::Cycle,
            "yyyymmdd" => Placeholder::CycleDate,
            "hh" => Placeholder::CycleHour,
            "leadtime" => Placeholder::LeadHours {
                width: DEFAULT_LEAD_WIDTH,
            },
            "validtime" => Placeholder::ValidTime,
            "variable" => Placeholder::Variable,
            _ => {
                return Err(TemplateError::UnsupportedPlaceholder {
                    template: template.to_string(),
                    placeholder: inner.to_string(),
                })
            }
        };

        match (placeholder, width) {
            (_, None) => Ok(placeholder),
            (Placeholder::LeadHours { .. }, Some(spec)) => {
                let digits = spec.strip_prefix('0').unwrap_or(spec);
                match digits.parse::<usize>() {
                    Ok(width) if (1..=MAX_LEAD_WIDTH).contains(&width) => {
                        Ok(Placeholder::LeadHours { width })
                    }
                    _ => Err(TemplateError::InvalidWidth {
                        template: template.to_string(),
                        placeholder: inner.to_string(),
                    }),
                }
            }
            (_, Some(_)) => Err(TemplateError::InvalidWidth {
                template: template.to_string(),
                placeholder: inner.to_string(),
            }),
        }
    }

    fn render(&self, out: &mut String, time: &TimeCoords, variable: &str) {
        use std::fmt::Write;

        // Writing into a String cannot fail.
        let _ = match self {
            Placeholder::Cycle => write!(out, "{}", time.cycle.format("%Y%m%d%H")),
            Placeholder::CycleDate => write!(out, "{}", time.cycle.format("%Y%m%d")),
            Placeholder::CycleHour => write!(out, "{}", time.cycle.format("%H")),
            Placeholder::LeadHours { width } => {
                write!(out, "{:0width$}", time.lead_hours(), width = *width)
            }
            Placeholder::ValidTime => write!(out, "{}", time.validtime().format("%Y%m%d%H")),
            Placeholder::Variable => write!(out, "{}", variable),
        };
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// A compiled locator template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl LocatorTemplate {
    /// Compile a template, rejecting anything outside the placeholder set.
    pub fn parse(raw: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = raw;
        let mut offset = 0;

        while let Some(open) = rest.find('{') {
            literal.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let close = after.find('}').ok_or_else(|| TemplateError::Unterminated {
                template: raw.to_string(),
                position: offset + open,
            })?;

            let inner = &after[..close];
            if inner.is_empty() {
                return Err(TemplateError::EmptyPlaceholder {
                    template: raw.to_string(),
                });
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }
            segments.push(Segment::Placeholder(Placeholder::parse(inner, raw)?));

            let consumed = open + 1 + close + 1;
            offset += consumed;
            rest = &rest[consumed..];
        }

        literal.push_str(rest);
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// Substitute every placeholder. Pure and deterministic.
    pub fn render(&self, time: &TimeCoords, variable: &str) -> String {
        let mut out = String::with_capacity(self.raw.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(s) => out.push_str(s),
                Segment::Placeholder(p) => p.render(&mut out, time, variable),
            }
        }
        out
    }

    /// Placeholders in template order.
    pub fn placeholders(&self) -> impl Iterator<Item = Placeholder> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Placeholder(p) => Some(*p),
            Segment::Literal(_) => None,
        })
    }

    /// True for `http://` and `https://` templates.
    pub fn is_remote(&self) -> bool {
        let lower = self.raw.to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for LocatorTemplate {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LocatorTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// A concrete, addressable source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    Path(PathBuf),
    Url(String),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Path(p) => write!(f, "{}", p.display()),
            Locator::Url(u) => f.write_str(u),
        }
    }
}

/// Resolve a literal template for one (cycle, leadtime, variable).
pub fn resolve_locator(
    template: &str,
    time: &TimeCoords,
    variable: &str,
) -> Result<String, TemplateError> {
    Ok(LocatorTemplate::parse(template)?.render(time, variable))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn tc(hours: u32) -> TimeCoords {
        TimeCoords::from_hours(Utc.with_ymd_and_hms(2024, 12, 19, 18, 0, 0).unwrap(), hours)
    }

    #[test]
    fn test_render_all_placeholders() {
        let s = resolve_locator(
            "/data/{yyyymmdd}/{hh}/{variable}_{cycle}_f{leadtime}_v{validtime}.grib2",
            &tc(12),
            "HGT",
        )
        .unwrap();
        assert_eq!(s, "/data/20241219/18/HGT_2024121918_f012_v2024122006.grib2");
    }

    #[test]
    fn test_render_lead_width() {
        assert_eq!(resolve_locator("f{leadtime:02}", &tc(6), "T").unwrap(), "f06");
        assert_eq!(resolve_locator("f{leadtime:4}", &tc(6), "T").unwrap(), "f0006");
        assert_eq!(resolve_locator("f{leadtime:02}", &tc(120), "T").unwrap(), "f120");
    }

    #[test]
    fn test_template_without_placeholders() {
        let t = LocatorTemplate::parse("https://some.url/path/to/a.grib2").unwrap();
        assert_eq!(t.placeholders().count(), 0);
        assert!(t.is_remote());
        assert_eq!(t.render(&tc(0), "HGT"), "https://some.url/path/to/a.grib2");
    }

    #[test]
    fn test_render_is_pure() {
        let t = LocatorTemplate::parse("/a/{cycle}/{leadtime}/{variable}").unwrap();
        let first = t.render(&tc(6), "SPFH");
        for _ in 0..10 {
            assert_eq!(t.render(&tc(6), "SPFH"), first);
        }
    }

    #[test]
    fn test_no_placeholder_leaks() {
        let t = LocatorTemplate::parse("{cycle}{yyyymmdd}{hh}{leadtime}{leadtime:02}{validtime}{variable}")
            .unwrap();
        for hours in [0, 6, 12, 240] {
            let rendered = t.render(&tc(hours), "REFC");
            assert!(!rendered.contains('{'), "leaked placeholder in {}", rendered);
            assert!(!rendered.contains('}'), "leaked placeholder in {}", rendered);
        }
    }

    #[test]
    fn test_unsupported_placeholder() {
        let err = LocatorTemplate::parse("/data/{level}/x").unwrap_err();
        assert_eq!(
            err,
            TemplateError::UnsupportedPlaceholder {
                template: "/data/{level}/x".to_string(),
                placeholder: "level".to_string(),
            }
        );
    }

    #[test]
    fn test_unterminated_placeholder() {
        let err = LocatorTemplate::parse("/data/{cycle}/{hh").unwrap_err();
        assert_eq!(
            err,
            TemplateError::Unterminated {
                template: "/data/{cycle}/{hh".to_string(),
                position: 14,
            }
        );
    }

    #[test]
    fn test_empty_and_bad_width() {
        assert!(matches!(
            LocatorTemplate::parse("/data/{}"),
            Err(TemplateError::EmptyPlaceholder { .. })
        ));
        assert!(matches!(
            LocatorTemplate::parse("{cycle:02}"),
            Err(TemplateError::InvalidWidth { .. })
        ));
        assert!(matches!(
            LocatorTemplate::parse("{leadtime:0x}"),
            Err(TemplateError::InvalidWidth { .. })
        ));
        assert!(matches!(
            LocatorTemplate::parse("{leadtime:00}"),
            Err(TemplateError::InvalidWidth { .. })
        ));
    }

    #[test]
    fn test_local_template_is_not_remote() {
        let t: LocatorTemplate = "/path/to/forecast".parse().unwrap();
        assert!(!t.is_remote());
        assert_eq!(t.to_string(), "/path/to/forecast");
    }
}
