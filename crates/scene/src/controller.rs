//! Drill-down scene controller.
//!
//! Owns the loaded dataset and the current [`SceneState`]. Every applied
//! interaction rebuilds the whole view from the immutable records; nothing is
//! cached between views.

use compute::{Bucket, TimeBucket, group_count, group_count_time_series};
use layers::scale::{
    categorical_position_scale, linear_count_scale, quantized_color_scale, time_position_scale,
};
use layers::symbology::{BAR_FILL, LINE_STROKE, MarkStyle};
use tracing::{debug, info};

use crate::dataset::{Dataset, RecordKeys};
use crate::state::{Interaction, SceneId, SceneState, transition};
use crate::view::{
    Axis, AxisKind, AxisOrient, BarMark, Legend, LegendEntry, LineMark, LinePoint, Mark,
    RegionMark, Renderer, SceneView, Tick, ViewConfig,
};

pub struct SceneController<R, K> {
    dataset: Dataset<R>,
    keys: K,
    config: ViewConfig,
    state: SceneState,
}

impl<R, K: RecordKeys<R>> SceneController<R, K> {
    pub fn new(dataset: Dataset<R>, keys: K, config: ViewConfig) -> Self {
        info!(
            records = dataset.records.len(),
            boundaries = dataset.boundaries.len(),
            "scene controller ready"
        );
        Self {
            dataset,
            keys,
            config,
            state: SceneState::Overview,
        }
    }

    pub fn state(&self) -> &SceneState {
        &self.state
    }

    pub fn dataset(&self) -> &Dataset<R> {
        &self.dataset
    }

    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// Transitions without rendering. Returns `true` if the state changed.
    pub fn apply(&mut self, interaction: &Interaction) -> bool {
        let next = transition(&self.state, interaction);
        if next == self.state {
            debug!(scene = %self.state.scene(), ?interaction, "interaction ignored");
            return false;
        }
        info!(
            from = %self.state.scene(),
            to = %next.scene(),
            category = next.selected_category(),
            sub_category = next.selected_sub_category(),
            "scene transition"
        );
        self.state = next;
        true
    }

    /// Applies `interaction` and, if the state changed, hands the rebuilt view
    /// to `renderer`. Returns whether a render happened.
    pub fn handle<T: Renderer>(
        &mut self,
        interaction: &Interaction,
        renderer: &mut T,
    ) -> Result<bool, T::Error> {
        if !self.apply(interaction) {
            return Ok(false);
        }
        self.render(renderer)?;
        Ok(true)
    }

    pub fn render<T: Renderer>(&self, renderer: &mut T) -> Result<(), T::Error> {
        renderer.render(&self.view())
    }

    /// Builds the view for the current state from scratch.
    pub fn view(&self) -> SceneView<'_> {
        match &self.state {
            SceneState::Overview => self.overview_view(),
            SceneState::BySubCategory { category } => self.breakdown_view(category),
            SceneState::Trend {
                category,
                sub_category,
            } => self.trend_view(category, sub_category),
        }
    }

    fn blank_view(&self, scene: SceneId, title: String) -> SceneView<'_> {
        SceneView {
            scene,
            title,
            width: self.config.width,
            height: self.config.height,
            marks: Vec::new(),
            axes: Vec::new(),
            legend: None,
            back_enabled: scene != SceneId::Overview,
        }
    }

    fn overview_view(&self) -> SceneView<'_> {
        let keys = &self.keys;
        let buckets = group_count(&self.dataset.records, |r| keys.category(r));
        debug!(categories = buckets.len(), "overview aggregated");
        let scale = quantized_color_scale(&buckets);

        let mut view = self.blank_view(SceneId::Overview, "Records by category".to_string());
        view.marks = self
            .dataset
            .boundaries
            .iter()
            .map(|feature| {
                let count = scale.count_for(&feature.name);
                let bin = scale.bin_for_count(count);
                Mark::Region(RegionMark {
                    name: feature.name.clone(),
                    geometry: &feature.geometry,
                    count,
                    bin,
                    style: MarkStyle::region(scale.color_for_bin(bin)),
                    on_select: Interaction::select(feature.name.as_str()),
                })
            })
            .collect();
        view.legend = Some(Legend {
            title: "Records".to_string(),
            entries: scale
                .thresholds()
                .into_iter()
                .map(|t| LegendEntry {
                    lower: t.lower,
                    upper: t.upper,
                    color: t.color,
                })
                .collect(),
        });
        view
    }

    fn breakdown_view(&self, category: &str) -> SceneView<'_> {
        let keys = &self.keys;
        let buckets: Vec<Bucket<&str>> = group_count(
            self.dataset
                .records
                .iter()
                .filter(|r| keys.category(r) == Some(category)),
            |r| keys.sub_category(r),
        );
        debug!(category, sub_categories = buckets.len(), "breakdown aggregated");

        let cfg = &self.config;
        let x = categorical_position_scale(&buckets, cfg.x_range(), cfg.band_padding);
        let y = linear_count_scale(&buckets, cfg.y_range());
        let baseline = y.map(0.0);

        let mut view = self.blank_view(SceneId::BySubCategory, format!("{category}: by type"));
        view.marks = buckets
            .iter()
            .filter_map(|b| {
                let band = x.band(b.key)?;
                let top = y.map(b.count as f64);
                Some(Mark::Bar(BarMark {
                    key: b.key.to_string(),
                    count: b.count,
                    x: band.position,
                    y: top,
                    width: band.bandwidth,
                    height: baseline - top,
                    style: MarkStyle::filled(BAR_FILL),
                    on_select: Interaction::select(b.key),
                }))
            })
            .collect();
        view.axes = vec![
            Axis {
                orient: AxisOrient::Bottom,
                kind: AxisKind::Band,
                offset: baseline,
                range: cfg.x_range(),
                ticks: x
                    .keys()
                    .iter()
                    .filter_map(|k| {
                        let band = x.band(k)?;
                        Some(Tick {
                            position: band.position + band.bandwidth * 0.5,
                            label: k.clone(),
                        })
                    })
                    .collect(),
            },
            self.count_axis(&y),
        ];
        view
    }

    fn trend_view(&self, category: &str, sub_category: &str) -> SceneView<'_> {
        let keys = &self.keys;
        let resolution = self.config.trend_resolution;
        let series: Vec<TimeBucket<String>> = group_count_time_series(
            self.dataset.records.iter().filter(|r| {
                keys.category(r) == Some(category) && keys.sub_category(r) == Some(sub_category)
            }),
            |r| keys.timestamp(r).and_then(|raw| resolution.bucket_key(raw)),
        );
        debug!(category, sub_category, points = series.len(), "trend aggregated");

        let cfg = &self.config;
        let y = linear_count_scale(&series, cfg.y_range());
        let mut view = self.blank_view(
            SceneId::Trend,
            format!("{category}: {sub_category} over time"),
        );

        let Some(x) = time_position_scale(&series, cfg.x_range()) else {
            view.marks = vec![Mark::Line(LineMark {
                points: Vec::new(),
                style: MarkStyle::line(LINE_STROKE, 1.5),
            })];
            view.axes = vec![
                Axis {
                    orient: AxisOrient::Bottom,
                    kind: AxisKind::Time,
                    offset: y.map(0.0),
                    range: cfg.x_range(),
                    ticks: Vec::new(),
                },
                self.count_axis(&y),
            ];
            return view;
        };

        view.marks = vec![Mark::Line(LineMark {
            points: series
                .iter()
                .map(|b| LinePoint {
                    time: b.time,
                    count: b.count,
                    x: x.map(b.time),
                    y: y.map(b.count as f64),
                })
                .collect(),
            style: MarkStyle::line(LINE_STROKE, 1.5),
        })];
        view.axes = vec![
            Axis {
                orient: AxisOrient::Bottom,
                kind: AxisKind::Time,
                offset: y.map(0.0),
                range: cfg.x_range(),
                ticks: x
                    .ticks(cfg.time_ticks)
                    .into_iter()
                    .map(|t| Tick {
                        position: x.map(t),
                        label: t.label(),
                    })
                    .collect(),
            },
            self.count_axis(&y),
        ];
        view
    }

    fn count_axis(&self, y: &layers::scale::LinearScale) -> Axis {
        Axis {
            orient: AxisOrient::Left,
            kind: AxisKind::Linear,
            offset: self.config.margin.left,
            range: y.range(),
            ticks: y
                .ticks(self.config.count_ticks)
                .into_iter()
                .map(|v| Tick {
                    position: y.map(v),
                    label: format!("{v}"),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SceneController;
    use compute::TimeResolution;
    use crate::dataset::{BoundaryFeature, Dataset, Record, RecordFields};
    use crate::state::{Interaction, SceneId, SceneState};
    use crate::view::{AxisKind, Mark, Renderer, SceneView, ViewConfig};
    use foundation::geometry::{GeoPoint, Geometry};
    use layers::symbology::SEQUENTIAL_REDS;
    use pretty_assertions::assert_eq;

    /// Captures a summary of every view it is handed.
    #[derive(Default)]
    struct Recorder {
        views: Vec<(SceneId, usize, bool)>,
    }

    impl Renderer for Recorder {
        type Error = std::convert::Infallible;

        fn render(&mut self, view: &SceneView<'_>) -> Result<(), Self::Error> {
            self.views
                .push((view.scene, view.marks.len(), view.back_enabled));
            Ok(())
        }
    }

    fn square(x: f64) -> Geometry {
        Geometry::Polygon(vec![vec![
            GeoPoint::new(x, 0.0),
            GeoPoint::new(x + 1.0, 0.0),
            GeoPoint::new(x + 1.0, 1.0),
            GeoPoint::new(x, 1.0),
            GeoPoint::new(x, 0.0),
        ]])
    }

    fn scenario() -> SceneController<Record, RecordFields> {
        let records = vec![
            Record::new("A", "X", "2020-01-01"),
            Record::new("A", "X", "2020-01-02"),
            Record::new("B", "Y", "2020-01-01"),
        ];
        let boundaries = vec![
            BoundaryFeature {
                name: "A".into(),
                geometry: square(0.0),
            },
            BoundaryFeature {
                name: "B".into(),
                geometry: square(1.0),
            },
            BoundaryFeature {
                name: "C".into(),
                geometry: square(2.0),
            },
        ];
        SceneController::new(
            Dataset::new(records, boundaries),
            RecordFields,
            ViewConfig::default(),
        )
    }

    #[test]
    fn overview_colours_every_boundary_with_zero_default() {
        let c = scenario();
        let view = c.view();
        assert_eq!(view.scene, SceneId::Overview);
        assert!(!view.back_enabled);
        assert_eq!(view.marks.len(), 3);

        let regions: Vec<(&str, u64, usize)> = view
            .marks
            .iter()
            .map(|m| match m {
                Mark::Region(r) => (r.name.as_str(), r.count, r.bin),
                other => panic!("unexpected mark {other:?}"),
            })
            .collect();
        assert_eq!(regions, vec![("A", 2, 8), ("B", 1, 4), ("C", 0, 0)]);

        let Mark::Region(c_mark) = &view.marks[2] else {
            unreachable!()
        };
        assert_eq!(c_mark.style.fill, Some(SEQUENTIAL_REDS[0]));
        assert_eq!(c_mark.on_select, Interaction::select("C"));
        assert_eq!(view.legend.as_ref().map(|l| l.entries.len()), Some(9));
    }

    #[test]
    fn drill_down_scenario_reaches_two_point_trend() {
        let mut c = scenario();
        let mut r = Recorder::default();

        assert!(c.handle(&Interaction::select("A"), &mut r).unwrap());
        assert_eq!(
            c.state(),
            &SceneState::BySubCategory {
                category: "A".into()
            }
        );

        assert!(c.handle(&Interaction::select("X"), &mut r).unwrap());
        assert_eq!(
            c.state(),
            &SceneState::Trend {
                category: "A".into(),
                sub_category: "X".into()
            }
        );

        let view = c.view();
        let Mark::Line(line) = &view.marks[0] else {
            panic!("trend must be a single line mark");
        };
        let points: Vec<(String, u64)> = line
            .points
            .iter()
            .map(|p| (p.time.date_key(), p.count))
            .collect();
        assert_eq!(
            points,
            vec![("2020-01-01".to_string(), 1), ("2020-01-02".to_string(), 1)]
        );
        assert!(line.points[0].x < line.points[1].x);
        let kinds: Vec<AxisKind> = view.axes.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AxisKind::Time, AxisKind::Linear]);

        assert!(c.handle(&Interaction::Back, &mut r).unwrap());
        assert_eq!(
            c.state(),
            &SceneState::BySubCategory {
                category: "A".into()
            }
        );

        assert_eq!(
            r.views,
            vec![
                (SceneId::BySubCategory, 1, true),
                (SceneId::Trend, 1, true),
                (SceneId::BySubCategory, 1, true),
            ]
        );
    }

    #[test]
    fn breakdown_bars_bind_sub_category_selection() {
        let mut c = scenario();
        c.apply(&Interaction::select("A"));
        let view = c.view();
        assert_eq!(view.title, "A: by type");
        assert_eq!(view.axes.len(), 2);
        let Mark::Bar(bar) = &view.marks[0] else {
            panic!("breakdown must contain bars");
        };
        assert_eq!(bar.key, "X");
        assert_eq!(bar.count, 2);
        assert!(bar.height > 0.0);
        assert_eq!(view.marks[0].on_select(), Some(&Interaction::select("X")));
    }

    #[test]
    fn selecting_category_without_records_gives_empty_breakdown() {
        let mut c = scenario();
        let mut r = Recorder::default();
        assert!(c.handle(&Interaction::select("C"), &mut r).unwrap());
        assert_eq!(c.view().marks.len(), 0);
        assert_eq!(r.views, vec![(SceneId::BySubCategory, 0, true)]);
    }

    #[test]
    fn ignored_interactions_do_not_render() {
        let mut c = scenario();
        let mut r = Recorder::default();
        assert!(!c.handle(&Interaction::Back, &mut r).unwrap());
        assert_eq!(c.state(), &SceneState::Overview);

        c.apply(&Interaction::select("A"));
        c.apply(&Interaction::select("X"));
        assert!(!c.handle(&Interaction::select("X"), &mut r).unwrap());
        assert!(r.views.is_empty());
    }

    #[test]
    fn trend_with_no_datable_records_is_an_empty_line() {
        let records = vec![
            Record {
                timestamp: None,
                ..Record::new("A", "X", "")
            },
            Record::new("A", "X", "garbage"),
        ];
        let mut c = SceneController::new(
            Dataset::new(records, Vec::new()),
            RecordFields,
            ViewConfig::default(),
        );
        c.apply(&Interaction::select("A"));
        c.apply(&Interaction::select("X"));
        let view = c.view();
        assert_eq!(view.scene, SceneId::Trend);
        let Mark::Line(line) = &view.marks[0] else {
            panic!("trend must be a single line mark");
        };
        assert!(line.points.is_empty());
        let kinds: Vec<AxisKind> = view.axes.iter().map(|a| a.kind).collect();
        assert_eq!(kinds, vec![AxisKind::Time, AxisKind::Linear]);
        assert!(view.axes[0].ticks.is_empty());
    }

    #[test]
    fn default_trend_keeps_same_day_timestamps_apart() {
        let records = vec![
            Record::new("A", "X", "2020-01-01 11:00:00"),
            Record::new("A", "X", "2020-01-01 10:00:00"),
            Record::new("A", "X", "2020-01-01 11:00:00"),
        ];
        let mut c = SceneController::new(
            Dataset::new(records, Vec::new()),
            RecordFields,
            ViewConfig::default(),
        );
        c.apply(&Interaction::select("A"));
        c.apply(&Interaction::select("X"));
        let view = c.view();
        let Mark::Line(line) = &view.marks[0] else {
            panic!("trend must be a single line mark");
        };
        let points: Vec<(String, u64)> = line
            .points
            .iter()
            .map(|p| (p.time.label(), p.count))
            .collect();
        assert_eq!(
            points,
            vec![
                ("2020-01-01 10:00:00".to_string(), 1),
                ("2020-01-01 11:00:00".to_string(), 2),
            ]
        );
        assert_eq!(view.axes[0].ticks[0].label, "2020-01-01 10:00:00");
    }

    #[test]
    fn day_resolution_merges_same_day_timestamps() {
        let records = vec![
            Record::new("A", "X", "2020-01-01 10:00:00"),
            Record::new("A", "X", "2020-01-01 11:00:00"),
        ];
        let mut c = SceneController::new(
            Dataset::new(records, Vec::new()),
            RecordFields,
            ViewConfig {
                trend_resolution: TimeResolution::Day,
                ..ViewConfig::default()
            },
        );
        c.apply(&Interaction::select("A"));
        c.apply(&Interaction::select("X"));
        let view = c.view();
        let Mark::Line(line) = &view.marks[0] else {
            panic!("trend must be a single line mark");
        };
        assert_eq!(line.points.len(), 1);
        assert_eq!(line.points[0].count, 2);
    }
}
