//! Thin WCS 1.0.0 client: GetCapabilities to discover layers and their
//! advertised WGS84 bounds, GetCoverage (KVP) to download a layer clipped to
//! a bounding box.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::blocking::Client;
use thiserror::Error;
use url::Url;

use crate::geo_core::BoundingBox;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Failure modes of the coverage service.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// The service returned an OGC service exception instead of a raster.
    #[error("WCS service exception: {0}")]
    ServiceException(String),

    /// The capabilities document advertises no coverage layers.
    #[error("no coverage layers advertised by {0}")]
    NoLayers(String),

    /// A layer was requested that the service does not advertise.
    #[error("unknown coverage layer {layer} (service {url})")]
    UnknownLayer { layer: String, url: String },

    /// The requested bounds do not overlap the layer's advertised bounds.
    #[error("bounds {requested:?} do not overlap layer bounds {layer:?}")]
    DisjointBounds {
        requested: BoundingBox,
        layer: BoundingBox,
    },

    /// The downloaded coverage is not a readable raster.
    #[error("coverage response is not a readable raster: {0}")]
    InvalidRaster(String),
}

/// A coverage layer advertised by a WCS capabilities document.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverageOffering {
    pub name: String,
    pub label: Option<String>,
    /// Lon/lat envelope of the layer, when advertised.
    pub wgs84_bounds: Option<BoundingBox>,
}

/// Manages getting data from a Web Coverage Service.
pub struct CoverageService {
    url: String,
    client: Client,
    offerings: Vec<CoverageOffering>,
}

impl CoverageService {
    /// Connect to a WCS endpoint and read its capabilities.
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        let capabilities_url = kvp_url(
            url,
            &[
                ("service", "WCS"),
                ("version", "1.0.0"),
                ("request", "GetCapabilities"),
            ],
        )?;
        log::debug!("GetCapabilities: {}", capabilities_url);

        let body = client
            .get(capabilities_url.as_str())
            .send()
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("GetCapabilities request failed for {}", url))?
            .text()
            .context("Failed to read capabilities body")?;

        let offerings = parse_capabilities(&body)
            .with_context(|| format!("Failed to parse capabilities from {}", url))?;
        if offerings.is_empty() {
            return Err(CoverageError::NoLayers(url.to_string()).into());
        }

        Ok(CoverageService {
            url: url.to_string(),
            client,
            offerings,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.url
    }

    pub fn offerings(&self) -> &[CoverageOffering] {
        &self.offerings
    }

    /// The first advertised layer, used when no layer is named explicitly.
    pub fn default_layer(&self) -> &str {
        &self.offerings[0].name
    }

    fn offering(&self, layer: &str) -> Result<&CoverageOffering> {
        self.offerings
            .iter()
            .find(|offering| offering.name == layer)
            .ok_or_else(|| {
                CoverageError::UnknownLayer {
                    layer: layer.to_string(),
                    url: self.url.clone(),
                }
                .into()
            })
    }

    /// Snap a bounding box to the advertised bounds of a layer.
    ///
    /// Servers reject requests reaching outside the coverage, so the request
    /// box is intersected with the layer envelope. Layers without an
    /// advertised envelope pass the box through unchanged.
    pub fn snap_bounds(&self, bounds: BoundingBox, layer: Option<&str>) -> Result<BoundingBox> {
        let layer = layer.unwrap_or_else(|| self.default_layer());
        let offering = self.offering(layer)?;
        match offering.wgs84_bounds {
            Some(envelope) => bounds.intersection(&envelope).ok_or_else(|| {
                CoverageError::DisjointBounds {
                    requested: bounds,
                    layer: envelope,
                }
                .into()
            }),
            None => Ok(bounds),
        }
    }

    /// Download the coverage in the given WGS84 box to `output` as a
    /// float GeoTIFF.
    ///
    /// `layer` defaults to the first advertised layer and `size` to the
    /// server's choice of resolution. The written file is opened with GDAL
    /// before returning; a response that is not a readable raster (service
    /// exceptions included) is an error and leaves no output behind.
    pub fn get_coverage(
        &self,
        bounds: BoundingBox,
        layer: Option<&str>,
        size: Option<(usize, usize)>,
        output: &Path,
    ) -> Result<()> {
        let layer = layer.unwrap_or_else(|| self.default_layer()).to_string();
        self.offering(&layer)?;

        let bbox = format!(
            "{},{},{},{}",
            bounds.min_x, bounds.min_y, bounds.max_x, bounds.max_y
        );
        let mut params = vec![
            ("service".to_string(), "WCS".to_string()),
            ("version".to_string(), "1.0.0".to_string()),
            ("request".to_string(), "GetCoverage".to_string()),
            ("coverage".to_string(), layer.clone()),
            ("crs".to_string(), "EPSG:4326".to_string()),
            ("bbox".to_string(), bbox),
            ("format".to_string(), "GeoTIFF_Float".to_string()),
        ];
        if let Some((width, height)) = size {
            params.push(("width".to_string(), width.to_string()));
            params.push(("height".to_string(), height.to_string()));
        }
        let pairs: Vec<(&str, &str)> = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let request_url = kvp_url(&self.url, &pairs)?;
        log::debug!("GetCoverage for {}: {}", layer, request_url);

        let bytes = self
            .client
            .get(request_url.as_str())
            .send()
            .and_then(|response| response.error_for_status())
            .with_context(|| format!("GetCoverage request failed for layer {}", layer))?
            .bytes()
            .context("Failed to read coverage body")?;

        // An XML body here is a service exception, not a raster
        if looks_like_xml(&bytes) {
            let message = exception_text(&bytes);
            return Err(CoverageError::ServiceException(message).into());
        }

        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
        }
        std::fs::write(output, &bytes)
            .with_context(|| format!("Failed to write coverage to {:?}", output))?;

        if let Err(err) = gdal::Dataset::open(output) {
            let _ = std::fs::remove_file(output);
            return Err(CoverageError::InvalidRaster(err.to_string()).into());
        }
        Ok(())
    }
}

/// Build a KVP request URL, preserving any query parameters already baked
/// into the endpoint.
fn kvp_url(endpoint: &str, params: &[(&str, &str)]) -> Result<Url> {
    let mut url =
        Url::parse(endpoint).with_context(|| format!("Invalid endpoint URL: {}", endpoint))?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url)
}

fn looks_like_xml(bytes: &[u8]) -> bool {
    bytes
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map_or(false, |&b| b == b'<')
}

/// Pull a human-readable message out of an OGC exception body.
fn exception_text(bytes: &[u8]) -> String {
    let body = String::from_utf8_lossy(bytes);
    let mut reader = Reader::from_str(&body);
    reader.trim_text(true);
    let mut in_exception = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if matches!(name.as_ref(), b"ServiceException" | b"ExceptionText") {
                    in_exception = true;
                }
            }
            Ok(Event::Text(t)) if in_exception => {
                if let Ok(text) = t.unescape() {
                    return text.trim().to_string();
                }
            }
            Ok(Event::Eof) | Err(_) => break,
            _ => {}
        }
    }
    // Fall back to an excerpt of the raw body
    body.chars().take(200).collect()
}

/// Parse a WCS 1.0.0 capabilities document into its coverage offerings.
pub(crate) fn parse_capabilities(xml: &str) -> Result<Vec<CoverageOffering>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut offerings = Vec::new();
    let mut current: Option<CoverageOffering> = None;
    let mut positions: Vec<(f64, f64)> = Vec::new();
    let mut in_envelope = false;
    let mut tag = String::new();

    loop {
        match reader
            .read_event()
            .context("Malformed capabilities document")?
        {
            Event::Start(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"CoverageOfferingBrief" | b"CoverageOffering" => {
                        current = Some(CoverageOffering {
                            name: String::new(),
                            label: None,
                            wgs84_bounds: None,
                        });
                    }
                    b"lonLatEnvelope" => {
                        in_envelope = true;
                        positions.clear();
                    }
                    other => {
                        tag = String::from_utf8_lossy(other).into_owned();
                    }
                }
            }
            Event::Text(t) => {
                if let Some(offering) = current.as_mut() {
                    let text = t.unescape().unwrap_or_default();
                    let text = text.trim();
                    if in_envelope && tag == "pos" {
                        let mut parts = text.split_whitespace();
                        if let (Some(x), Some(y)) = (parts.next(), parts.next()) {
                            if let (Ok(x), Ok(y)) = (x.parse(), y.parse()) {
                                positions.push((x, y));
                            }
                        }
                    } else if tag == "name" && offering.name.is_empty() {
                        offering.name = text.to_string();
                    } else if tag == "label" && offering.label.is_none() {
                        offering.label = Some(text.to_string());
                    }
                }
            }
            Event::End(e) => {
                let name = e.local_name();
                match name.as_ref() {
                    b"lonLatEnvelope" => {
                        in_envelope = false;
                        if let (Some(offering), [(x1, y1), (x2, y2), ..]) =
                            (current.as_mut(), positions.as_slice())
                        {
                            offering.wgs84_bounds = Some(BoundingBox::new(
                                x1.min(*x2),
                                y1.min(*y2),
                                x1.max(*x2),
                                y1.max(*y2),
                            ));
                        }
                    }
                    b"CoverageOfferingBrief" | b"CoverageOffering" => {
                        if let Some(offering) = current.take() {
                            if !offering.name.is_empty() {
                                offerings.push(offering);
                            }
                        }
                    }
                    _ => {}
                }
                tag.clear();
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(offerings)
}
