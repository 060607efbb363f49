//! `EJScreen` environmental justice indicators for the block groups in a
//! region: one socioeconomic and one environmental choropleth side by side,
//! each overlaid with the violation markers of the region's systems.

use std::collections::BTreeMap;

use nj_sdwa_analytics::{format_percent, format_rounded, round2};
use nj_sdwa_models::{BlockGroup, EjKind, EjMeasure, EjScores, Region};
use nj_sdwa_render::{
    DataTable, LinearColormap, MapLayer, MapView, PolygonStyle, Ramp, cell, popup,
};
use nj_sdwa_spatial::{Selection, intersecting, left_join_by_key};
use serde::Serialize;
use serde_json::Value;

use crate::violations::count_markers;
use crate::{Dashboard, Page, PageError, properties, service_area_layer};

/// A measure offered in one of the two pickers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MeasureOption {
    pub measure: EjMeasure,
    pub kind: EjKind,
    pub label: String,
}

/// One choropleth with its legend text.
#[derive(Debug, Clone, Serialize)]
pub struct EjPanel {
    pub measure: EjMeasure,
    pub label: String,
    pub definition: String,
    pub unit: String,
    pub map: MapView,
}

#[derive(Debug, Clone, Serialize)]
pub struct EjPage {
    pub socioeconomic: EjPanel,
    pub environmental: EjPanel,
    pub options: Vec<MeasureOption>,
    pub table: DataTable,
    pub csv: String,
}

impl Page for EjPage {
    const CSV_FILENAME: &'static str = "selected_area_ej_measures.csv";

    fn table(&self) -> &DataTable {
        &self.table
    }

    fn csv(&self) -> &str {
        &self.csv
    }
}

const fn default_measure(kind: EjKind) -> EjMeasure {
    match kind {
        EjKind::Socioeconomic => EjMeasure::PeopColorPct,
        EjKind::Environmental => EjMeasure::Dslpm,
    }
}

fn resolve_measure(requested: Option<EjMeasure>, kind: EjKind) -> Result<EjMeasure, PageError> {
    match requested {
        None => Ok(default_measure(kind)),
        Some(measure) if measure.kind() == kind => Ok(measure),
        Some(measure) => Err(PageError::InvalidMeasure {
            measure: measure.column().to_string(),
        }),
    }
}

/// Value painted on the map and the text shown in the popup.
fn display_value(measure: EjMeasure, raw: Option<f64>) -> (Option<f64>, String) {
    let Some(raw) = raw.filter(|v| !v.is_nan()) else {
        return (None, "No data".to_string());
    };
    match measure.kind() {
        EjKind::Socioeconomic => (Some(round2(raw * 100.0)), format_percent(raw)),
        EjKind::Environmental => (Some(round2(raw)), format_rounded(raw)),
    }
}

const fn ramp(kind: EjKind) -> Ramp {
    match kind {
        EjKind::Socioeconomic => Ramp::Greens,
        EjKind::Environmental => Ramp::Blues,
    }
}

fn label_for(labels: &BTreeMap<EjMeasure, String>, measure: EjMeasure) -> String {
    labels
        .get(&measure)
        .cloned()
        .unwrap_or_else(|| measure.column().to_string())
}

fn panel(
    measure: EjMeasure,
    label: String,
    region: &Region,
    joined: &[(&BlockGroup, Option<&EjScores>)],
    service_areas: &Selection,
    violations: &MapLayer,
) -> EjPanel {
    let values: Vec<(Option<f64>, String)> = joined
        .iter()
        .map(|(_, scores)| display_value(measure, scores.and_then(|s| s.get(measure))))
        .collect();
    let colormap = LinearColormap::scaled(ramp(measure.kind()), values.iter().map(|v| v.0));

    let mut layer = MapLayer::new(label.clone());
    for ((group, _), (value, text)) in joined.iter().zip(&values) {
        layer.push_polygon(
            &group.geometry,
            &PolygonStyle::block_group(colormap.color(*value)),
            popup(&group.geoid, &[(label.as_str(), text.clone())]),
            properties([
                ("GEOID", Value::from(group.geoid.as_str())),
                (measure.column(), Value::from(*value)),
            ]),
        );
    }

    let map = MapView::new(Some(&region.bounding_box()))
        .with_layer(layer.with_colormap(colormap))
        .with_layer(service_area_layer(service_areas))
        .with_layer(violations.clone());

    EjPanel {
        measure,
        definition: measure.definition().to_string(),
        unit: measure.unit().to_string(),
        label,
        map,
    }
}

fn ej_table(joined: &[(&BlockGroup, Option<&EjScores>)]) -> DataTable {
    let mut table = DataTable::new(
        std::iter::once("GEOID").chain(EjMeasure::all().iter().map(|m| m.column())),
    );
    for (group, scores) in joined {
        let mut row = vec![group.geoid.clone()];
        row.extend(
            EjMeasure::all()
                .iter()
                .map(|&m| cell(scores.and_then(|s| s.get(m)))),
        );
        table.push_row(row);
    }
    table
}

impl Dashboard {
    async fn measure_labels(&self) -> Result<BTreeMap<EjMeasure, String>, PageError> {
        let descriptions = self.source.ej_descriptions().await?;
        Ok(descriptions.iter().cloned().collect())
    }

    /// Every measure with its display label, socioeconomic first.
    ///
    /// # Errors
    ///
    /// * [`PageError::Database`] if the descriptions cannot be read
    pub async fn ej_measures(&self) -> Result<Vec<MeasureOption>, PageError> {
        let labels = self.measure_labels().await?;
        Ok(EjMeasure::all()
            .iter()
            .map(|&measure| MeasureOption {
                measure,
                kind: measure.kind(),
                label: label_for(&labels, measure),
            })
            .collect())
    }

    /// Choropleths of one socioeconomic and one environmental indicator
    /// over the block groups touching `region`. Either measure defaults to
    /// the first of its kind.
    ///
    /// # Errors
    ///
    /// * [`PageError::InvalidMeasure`] if a measure is given for the wrong
    ///   panel
    /// * [`PageError::Fetch`] if block groups cannot be loaded
    /// * [`PageError::Database`] if the `EJScreen` tables cannot be read
    pub async fn environmental_justice(
        &self,
        region: &Region,
        socioeconomic: Option<EjMeasure>,
        environmental: Option<EjMeasure>,
    ) -> Result<EjPage, PageError> {
        let socioeconomic = resolve_measure(socioeconomic, EjKind::Socioeconomic)?;
        let environmental = resolve_measure(environmental, EjKind::Environmental)?;

        let candidates = self.source.block_groups(&region.bounding_box()).await?;
        let groups = intersecting(region, &candidates);
        let geoids: Vec<String> = groups.iter().map(|g| g.geoid.clone()).collect();
        let scores = if geoids.is_empty() {
            Vec::new()
        } else {
            self.source.ej_scores(&geoids).await?.to_vec()
        };
        let joined = left_join_by_key(&groups, &scores, |g| g.geoid.clone(), |s| s.geoid.clone());
        log::info!(
            "EJ: {} block groups, {} with scores",
            joined.len(),
            joined.iter().filter(|(_, s)| s.is_some()).count()
        );

        let selection = self.selection(region).await?;
        let violations = count_markers(&self.selection_violations(&selection).await?.counts);
        let options = self.ej_measures().await?;
        let labels: BTreeMap<EjMeasure, String> = options
            .iter()
            .map(|o| (o.measure, o.label.clone()))
            .collect();

        let table = ej_table(&joined);
        let csv = table.to_csv()?;

        Ok(EjPage {
            socioeconomic: panel(
                socioeconomic,
                label_for(&labels, socioeconomic),
                region,
                &joined,
                &selection,
                &violations,
            ),
            environmental: panel(
                environmental,
                label_for(&labels, environmental),
                region,
                &joined,
                &selection,
                &violations,
            ),
            options,
            table,
            csv,
        })
    }
}
