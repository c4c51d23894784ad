// Geographic helpers for the heatmap page.
//
// Region names are matched against a fixed table of regency/city
// centroids. The boundary overlay is downloaded on a best-effort basis;
// the map is still written when the download fails.

use crate::error::{ReportError, Result};
use crate::output::ensure_parent;
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Centre of the province, used for names missing from the table.
pub const DEFAULT_CENTROID: (f64, f64) = (-6.9, 107.6);

static CENTROIDS: Lazy<HashMap<&'static str, (f64, f64)>> = Lazy::new(|| {
    HashMap::from([
        ("Kabupaten Bogor", (-6.479679, 106.824965)),
        ("Kabupaten Sukabumi", (-6.915727, 106.932576)),
        ("Kabupaten Cianjur", (-6.822558, 107.139542)),
        ("Kabupaten Bandung", (-7.012851, 107.528627)),
        ("Kabupaten Garut", (-7.202988, 107.885592)),
        ("Kabupaten Tasikmalaya", (-7.361212, 108.112488)),
        ("Kabupaten Ciamis", (-7.325788, 108.3514)),
        ("Kabupaten Kuningan", (-6.976233, 108.482982)),
        ("Kabupaten Cirebon", (-6.764507, 108.478858)),
        ("Kabupaten Majalengka", (-6.8361, 108.2270)),
        ("Kabupaten Sumedang", (-6.8607, 107.9201)),
        ("Kabupaten Indramayu", (-6.337707, 108.320823)),
        ("Kabupaten Subang", (-6.571549, 107.762495)),
        ("Kabupaten Purwakarta", (-6.551701, 107.446541)),
        ("Kabupaten Karawang", (-6.301721, 107.30529)),
        ("Kabupaten Bekasi", (-6.364614, 107.172509)),
        ("Kabupaten Bandung Barat", (-6.840651, 107.512302)),
        ("Kabupaten Pangandaran", (-7.701397, 108.495155)),
        ("Kota Bogor", (-6.594946, 106.794913)),
        ("Kota Sukabumi", (-6.918366, 106.931496)),
        ("Kota Bandung", (-6.910786, 107.609757)),
        ("Kota Cirebon", (-6.707076, 108.557818)),
        ("Kota Bekasi", (-6.236221, 106.994293)),
        ("Kota Depok", (-6.394473, 106.822692)),
        ("Kota Cimahi", (-6.87121, 107.555486)),
        ("Kota Tasikmalaya", (-7.316436, 108.1971)),
        ("Kota Banjar", (-7.362487, 108.55887)),
    ])
});

/// Centroid of a region and whether the name was found in the table.
pub fn locate(region: &str) -> ((f64, f64), bool) {
    match CENTROIDS.get(region) {
        Some(c) => (*c, true),
        None => (DEFAULT_CENTROID, false),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatPoint {
    pub region: String,
    pub latitude: f64,
    pub longitude: f64,
    pub total: u64,
}

impl HeatPoint {
    /// Heat layer weight: births in units of ten thousand.
    pub fn intensity(&self) -> f64 {
        self.total as f64 / 10_000.0
    }
}

/// Download the boundary GeoJSON. Any transport failure, non-2xx status
/// or malformed body is a `Network` error for the caller to downgrade.
pub fn fetch_boundary(url: &str, timeout_secs: u64) -> Result<Value> {
    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| ReportError::Network(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .map_err(|e| ReportError::Network(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ReportError::Network(format!("download failed with status {status}")));
    }

    let text = response
        .text()
        .map_err(|e| ReportError::Network(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| ReportError::Network(format!("invalid GeoJSON: {e}")))
}

/// Write a standalone Leaflet page with a heat layer, one tooltip marker
/// per region and, when available, the boundary outlines.
pub fn write_heatmap_html(path: &Path, title: &str, points: &[HeatPoint], boundary: Option<&Value>) -> Result<()> {
    ensure_parent(path)?;
    let heat: Vec<Value> = points
        .iter()
        .map(|p| json!([p.latitude, p.longitude, p.intensity()]))
        .collect();
    let markers: Vec<Value> = points
        .iter()
        .map(|p| {
            json!({
                "lat": p.latitude,
                "lon": p.longitude,
                "label": format!("<b>{}</b><br>Total Kelahiran: {}", p.region, crate::util::format_int(p.total)),
            })
        })
        .collect();

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css">
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js"></script>
<style>html, body, #map {{ height: 100%; margin: 0; }} h3 {{ text-align: center; font-size: 16px; margin: 6px; }}</style>
</head>
<body>
<h3><b>{title}</b></h3>
<div id="map"></div>
<script>
var map = L.map('map').setView([{lat}, {lon}], 8);
L.tileLayer('https://{{s}}.basemaps.cartocdn.com/light_all/{{z}}/{{x}}/{{y}}.png', {{ attribution: '&copy; OpenStreetMap &copy; CARTO' }}).addTo(map);
L.heatLayer({heat}, {{ radius: 40, blur: 25, maxZoom: 10, minOpacity: 0.4 }}).addTo(map);
{markers}.forEach(function (m) {{
  L.circleMarker([m.lat, m.lon], {{ radius: 4, color: 'green', fill: true, fillOpacity: 0.7 }}).bindTooltip(m.label).addTo(map);
}});
var boundary = {boundary};
if (boundary) {{
  L.geoJSON(boundary, {{ style: {{ fillColor: 'none', color: 'green', weight: 3, opacity: 0.6 }} }}).addTo(map);
}}
</script>
</body>
</html>
"#,
        title = title,
        lat = DEFAULT_CENTROID.0,
        lon = DEFAULT_CENTROID.1,
        heat = script_json(&Value::Array(heat))?,
        markers = script_json(&Value::Array(markers))?,
        boundary = match boundary {
            Some(b) => script_json(b)?,
            None => "null".to_string(),
        },
    );
    fs::write(path, html)?;
    Ok(())
}

/// JSON safe to inline in a `<script>` element.
fn script_json(value: &Value) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;
    use tempfile::TempDir;

    /// Answer a single HTTP request with `response` and return its URL.
    fn serve_once(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/Jabar_By_Kab.geojson")
    }

    #[test]
    fn known_regions_are_located() {
        let ((lat, lon), mapped) = locate("Kota Bandung");
        assert!(mapped);
        assert!((lat + 6.910786).abs() < 1e-9);
        assert!((lon - 107.609757).abs() < 1e-9);
    }

    #[test]
    fn unknown_regions_fall_back_to_province_centre() {
        assert_eq!(locate("Unknown"), (DEFAULT_CENTROID, false));
    }

    #[test]
    fn unreachable_boundary_is_network_error() {
        let err = fetch_boundary("http://127.0.0.1:9/boundary.geojson", 1).unwrap_err();
        assert!(matches!(err, ReportError::Network(_)));
    }

    #[test]
    fn non_success_status_is_network_error() {
        let url = serve_once("HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\nConnection: close\r\n\r\nnot found");
        match fetch_boundary(&url, 5) {
            Err(ReportError::Network(msg)) => assert!(msg.contains("404"), "{msg}"),
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_body_is_network_error() {
        let url = serve_once("HTTP/1.1 200 OK\r\nContent-Length: 12\r\nConnection: close\r\n\r\n<html></html");
        match fetch_boundary(&url, 5) {
            Err(ReportError::Network(msg)) => assert!(msg.contains("invalid GeoJSON"), "{msg}"),
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[test]
    fn valid_body_is_parsed() {
        let url = serve_once(
            "HTTP/1.1 200 OK\r\nContent-Length: 42\r\nConnection: close\r\n\r\n{\"type\":\"FeatureCollection\",\"features\":[]}",
        );
        let value = fetch_boundary(&url, 5).unwrap();
        assert_eq!(value["type"], "FeatureCollection");
    }

    #[test]
    fn heatmap_html_embeds_points() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map").join("heatmap.html");
        let points = vec![HeatPoint {
            region: "Kota Bogor".into(),
            latitude: -6.594946,
            longitude: 106.794913,
            total: 250_000,
        }];
        write_heatmap_html(&path, "Peta Heatmap", &points, None).unwrap();
        let html = fs::read_to_string(&path).unwrap();
        assert!(html.contains("L.heatLayer([[-6.594946,106.794913,25.0]]"));
        assert!(html.contains("var boundary = null;"));
        assert!(html.contains("250.000"));
    }
}
