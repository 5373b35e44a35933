use super::geojson::{value_text, Feature};
use serde::Serialize;

const NAME_KEYS: &[&str] = &[
    "name",
    "Name",
    "NAME",
    "facility_name",
    "hospital_name",
    "center_name",
    "clinic_name",
];

/// Keys never listed as popup detail rows: names, locations, contact info, ids.
const HIDDEN_KEYS: &[&str] = &[
    "name", "Name", "NAME", "facility_name", "hospital_name", "center_name", "clinic_name",
    "wlyt", "Wlyt", "WLYT", "wilayat", "Wilayat", "WILAYAT",
    "governorate", "Governorate", "GOVERNORATE", "muhafazah", "Muhafazah", "MUHAFAZAH",
    "address", "Address", "ADDRESS", "location", "Location", "LOCATION",
    "phone", "Phone", "PHONE", "telephone", "Telephone", "TELEPHONE",
    "email", "Email", "EMAIL", "website", "Website", "WEBSITE", "url", "URL",
    "fid", "FID", "Fid",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Popup {
    pub title: String,
    pub details: Vec<(String, String)>,
}

impl Popup {
    pub fn for_feature(feature: &Feature, layer_key: &str) -> Self {
        let title = NAME_KEYS
            .iter()
            .find_map(|k| feature.prop(k))
            .unwrap_or_else(|| layer_key.to_string());

        let details = feature
            .properties
            .iter()
            .flatten()
            .filter(|(k, _)| !HIDDEN_KEYS.contains(&k.as_str()))
            .filter_map(|(k, v)| value_text(v).map(|text| (k.clone(), text)))
            .collect();

        Self { title, details }
    }

    pub fn to_html(&self) -> String {
        let mut html = String::from(r#"<div class="popup">"#);
        html.push_str(&format!(
            r#"<div class="popup-title">{}</div>"#,
            escape_html(&self.title)
        ));
        for (k, v) in &self.details {
            html.push_str(&format!(
                r#"<div class="popup-row"><strong>{}:</strong> {}</div>"#,
                escape_html(k),
                escape_html(v)
            ));
        }
        html.push_str("</div>");
        html
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn feature(props: serde_json::Value) -> Feature {
        serde_json::from_value(json!({"type": "Feature", "properties": props})).unwrap()
    }

    #[test]
    fn test_popup_title_and_details() {
        let f = feature(json!({
            "fid": 7,
            "hospital_name": "Royal Hospital",
            "Beds": 630,
            "Wilayat": "Bawshar",
            "Notes": "  ",
            "Type": "Tertiary"
        }));
        let p = Popup::for_feature(&f, "Hospital Locations");
        assert_eq!(p.title, "Royal Hospital");
        assert_eq!(
            p.details,
            vec![
                ("Beds".to_string(), "630".to_string()),
                ("Type".to_string(), "Tertiary".to_string())
            ]
        );
    }

    #[test]
    fn test_popup_treats_zero_as_absent() {
        let p = Popup::for_feature(&feature(json!({"name": 0, "Beds": 0, "ICU": 4})), "Clinics");
        assert_eq!(p.title, "Clinics");
        assert_eq!(p.details, vec![("ICU".to_string(), "4".to_string())]);
    }

    #[test]
    fn test_popup_falls_back_to_layer_key() {
        let p = Popup::for_feature(&feature(json!(null)), "Pharmacies");
        assert_eq!(p.title, "Pharmacies");
        assert!(p.details.is_empty());
    }

    #[test]
    fn test_popup_html_is_escaped() {
        let p = Popup {
            title: "A & B".into(),
            details: vec![("<k>".into(), "\"v\"".into())],
        };
        assert_eq!(
            p.to_html(),
            concat!(
                r#"<div class="popup"><div class="popup-title">A &amp; B</div>"#,
                r#"<div class="popup-row"><strong>&lt;k&gt;:</strong> &quot;v&quot;</div></div>"#,
            )
        );
    }
}
