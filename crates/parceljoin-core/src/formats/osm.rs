//! OpenStreetMap extract reader.
//!
//! Both OSM encodings (XML here, Overpass JSON in [`super::overpass`]) are
//! first decoded into an [`OsmExtract`], then assembled into footprints by
//! the same code so the two formats cannot drift apart.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{ParceljoinError, Result};
use crate::formats::{dataset_name, read_input, FootprintReader};
use crate::models::geometry::validate_ring;
use crate::models::{Coord, Fallback, FootprintDataset, RawFootprint, RawHeight, SkipReason, StageReport};

const FORMAT_NAME: &str = "OSM XML";

/// Feet to meters
const FEET_TO_METERS: f64 = 0.3048;

/// A way as found in the extract, references unresolved
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OsmWay {
    pub id: String,
    pub refs: Vec<String>,
    pub tags: HashMap<String, String>,
}

impl OsmWay {
    /// A `building` tag of any value except `no` marks a footprint
    pub fn is_building(&self) -> bool {
        self.tags.get("building").is_some_and(|v| v != "no")
    }

    /// `height`, falling back to `building:height`
    pub fn height_tag(&self) -> Option<&str> {
        ["height", "building:height"]
            .iter()
            .filter_map(|key| self.tags.get(*key))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }
}

/// Points and ways decoded from an OSM document
#[derive(Debug, Clone, Default)]
pub struct OsmExtract {
    /// Point id to `[lon, lat]`
    pub points: HashMap<String, Coord>,

    /// Ways in document order
    pub ways: Vec<OsmWay>,

    /// Points dropped because lat/lon did not parse
    pub invalid_points: usize,
}

impl OsmExtract {
    /// Resolve building ways into footprints.
    ///
    /// Missing point references are dropped from the outline; the way is only
    /// skipped if fewer than three distinct vertices remain.
    pub fn into_footprints(self) -> (Vec<RawFootprint>, StageReport) {
        let mut report = StageReport::new();
        for _ in 0..self.invalid_points {
            report.record_skip(SkipReason::InvalidPointCoordinates);
        }

        let mut footprints = Vec::new();
        for way in self.ways.iter().filter(|w| w.is_building()) {
            let mut ring = Vec::with_capacity(way.refs.len());
            let mut missing = 0;
            for point_ref in &way.refs {
                match self.points.get(point_ref) {
                    Some(coord) => ring.push(*coord),
                    None => missing += 1,
                }
            }
            report.record_fallbacks(Fallback::MissingPointRef, missing);

            if let Err(reason) = validate_ring(&ring) {
                tracing::debug!(way = %way.id, reason = %reason, "Skipping building way");
                report.record_skip(reason);
                continue;
            }

            let height = match way.height_tag() {
                Some(raw) => match parse_height_tag(raw) {
                    Some(meters) => RawHeight::Measured(meters),
                    None => {
                        tracing::debug!(way = %way.id, height = raw, "Unparsable height tag");
                        report.record_fallback(Fallback::UnparsableHeightTag);
                        RawHeight::Missing
                    }
                },
                None => RawHeight::Missing,
            };

            footprints.push(RawFootprint::new(way.id.clone(), ring).with_height(height));
            report.record_kept();
        }

        (footprints, report)
    }
}

/// Parse an OSM height value such as `45.5`, `45.5m`, `12 ft` into meters.
///
/// Returns `None` for anything that is not a number followed by an optional
/// known unit.
pub fn parse_height_tag(raw: &str) -> Option<f64> {
    let raw = raw.trim();
    let split = raw
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || matches!(c, '.' | '-' | '+')))
        .map(|(idx, _)| idx)
        .unwrap_or(raw.len());
    let (number, unit) = raw.split_at(split);

    let value: f64 = number.trim().parse().ok()?;
    let factor = match unit.trim().to_lowercase().as_str() {
        "" | "m" | "meter" | "meters" | "metre" | "metres" => 1.0,
        "ft" | "feet" | "'" => FEET_TO_METERS,
        _ => return None,
    };

    let meters = value * factor;
    meters.is_finite().then_some(meters)
}

/// OpenStreetMap XML reader (`.osm`, `.xml`)
pub struct OsmXmlReader;

#[async_trait]
impl FootprintReader for OsmXmlReader {
    async fn read(&self, path: &Path) -> Result<FootprintDataset> {
        let content = read_input(path).await?;
        let extract = parse_osm_xml(&content)?;
        let (footprints, report) = extract.into_footprints();

        tracing::info!(
            path = %path.display(),
            footprints = footprints.len(),
            skipped = report.skipped_total(),
            "Parsed OSM XML extract"
        );

        Ok(FootprintDataset {
            name: dataset_name(path),
            format_name: FORMAT_NAME.to_string(),
            footprints,
            report,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["osm", "xml"]
    }

    fn format_name(&self) -> &str {
        FORMAT_NAME
    }
}

/// Decode an OSM XML document into points and ways
pub fn parse_osm_xml(content: &str) -> Result<OsmExtract> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut extract = OsmExtract::default();
    let mut current_way: Option<OsmWay> = None;
    let mut saw_root = false;

    loop {
        let event = reader.read_event().map_err(|e| {
            ParceljoinError::invalid(
                FORMAT_NAME,
                format!("{} at byte {}", e, reader.error_position()),
            )
        })?;

        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.name();

                if !saw_root {
                    if name.as_ref() != b"osm" {
                        return Err(ParceljoinError::invalid(
                            FORMAT_NAME,
                            format!(
                                "expected <osm> root element, found <{}>",
                                String::from_utf8_lossy(name.as_ref())
                            ),
                        ));
                    }
                    saw_root = true;
                    continue;
                }

                match name.as_ref() {
                    b"node" => match parse_node(e)? {
                        Some((id, coord)) => {
                            extract.points.insert(id, coord);
                        }
                        None => extract.invalid_points += 1,
                    },
                    b"way" => {
                        let way = OsmWay { id: attr(e, b"id")?.unwrap_or_default(), ..Default::default() };
                        if is_empty {
                            extract.ways.push(way);
                        } else {
                            current_way = Some(way);
                        }
                    }
                    b"nd" => {
                        if let (Some(way), Some(point_ref)) = (current_way.as_mut(), attr(e, b"ref")?) {
                            way.refs.push(point_ref);
                        }
                    }
                    b"tag" => {
                        if let Some(way) = current_way.as_mut() {
                            if let (Some(k), Some(v)) = (attr(e, b"k")?, attr(e, b"v")?) {
                                way.tags.insert(k, v);
                            }
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) if e.name().as_ref() == b"way" => {
                if let Some(way) = current_way.take() {
                    extract.ways.push(way);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !saw_root {
        return Err(ParceljoinError::invalid(FORMAT_NAME, "missing <osm> root element"));
    }

    Ok(extract)
}

/// Parse a `<node>`; `None` when it has no usable id or coordinates
fn parse_node(e: &BytesStart) -> Result<Option<(String, Coord)>> {
    let id = attr(e, b"id")?;
    let lat = attr(e, b"lat")?.and_then(|v| v.trim().parse::<f64>().ok());
    let lon = attr(e, b"lon")?.and_then(|v| v.trim().parse::<f64>().ok());

    Ok(match (id, lon, lat) {
        (Some(id), Some(lon), Some(lat)) if lon.is_finite() && lat.is_finite() => {
            Some((id, [lon, lat]))
        }
        _ => None,
    })
}

/// Unescaped value of one attribute
fn attr(e: &BytesStart, key: &[u8]) -> Result<Option<String>> {
    for attribute in e.attributes() {
        let attribute = attribute
            .map_err(|err| ParceljoinError::invalid(FORMAT_NAME, format!("bad attribute: {}", err)))?;
        if attribute.key.as_ref() == key {
            let value = attribute
                .unescape_value()
                .map_err(|err| ParceljoinError::invalid(FORMAT_NAME, err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
