use eframe::egui::{Color32, Pos2, Rect as UiRect, Vec2};

use crate::animation::{AnimRect, AnimationState, EntranceAnimation};
use crate::canvas::ContainerTransform;
use crate::document::{Dataset, Document};
use crate::error::{Error, Result};
use crate::metrics::{derive_metrics, DerivedMetrics};
use crate::options::RenderOptions;
use crate::scales::{BrightnessScale, OrdinalScale};
use crate::text_fit::{fit_text, TextMeasure};
use crate::tooltip::TooltipController;
use crate::treemap::layout_documents;

pub const FONT_SIZE: f32 = 14.0;
pub const FILL_OPACITY: f32 = 0.8;
/// Horizontal room kept free around a label.
const LABEL_INSET: f32 = 6.0;

/// One visual group: a document's rectangle and its fitted label.
#[derive(Debug, Clone)]
pub struct Leaf {
    /// Index into [`TreemapChart::documents`]
    pub document: usize,
    /// Group origin in canvas space
    pub origin: Pos2,
    pub size: Vec2,
    /// From the brightness scale
    pub fill: Color32,
    /// From the categorical scale
    pub group_color: Color32,
    pub label: String,
    /// Text of the configured value field
    pub value: String,
}

impl Leaf {
    pub fn rect(&self) -> UiRect {
        UiRect::from_min_size(self.origin, self.size)
    }
}

/// Where a leaf sits on one animation frame, in canvas space.
#[derive(Debug, Clone)]
pub struct LeafFrame<'a> {
    pub leaf: &'a Leaf,
    pub rect: UiRect,
    pub label_pos: Pos2,
    pub label_opacity: f32,
    pub font_size: f32,
}

#[derive(Debug, Clone)]
pub struct ChartFrame<'a> {
    pub state: AnimationState,
    pub container: ContainerTransform,
    pub leaves: Vec<LeafFrame<'a>>,
}

/// What the host should do after a click on a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A caller click handler ran.
    Handled,
    /// No handler configured: open this link in a new browsing context.
    OpenLink(String),
}

/// A rendered treemap: the drawable surface, its entrance animation and its tooltip.
///
/// Every render builds a fresh chart; replacing the old one discards whatever it had
/// drawn, including an unfinished entrance and the old tooltip.
pub struct TreemapChart {
    options: RenderOptions,
    documents: Vec<Document>,
    metrics: Vec<DerivedMetrics>,
    leaves: Vec<Leaf>,
    container: ContainerTransform,
    animation: EntranceAnimation,
    tooltip: TooltipController,
    hovered: Option<usize>,
}

impl TreemapChart {
    /// Derive metrics, build scales, lay out and draw `data`, starting the entrance at `now`
    /// (seconds on the host clock).
    pub fn render(
        data: Option<&Dataset>,
        options: RenderOptions,
        measure: &dyn TextMeasure,
        now: f64,
    ) -> Result<Self> {
        let data = data.ok_or(Error::MissingData)?;
        let documents = data.documents.clone();
        let metrics = derive_metrics(&documents);

        let colors = OrdinalScale::new(
            documents
                .iter()
                .zip(&metrics)
                .map(|(doc, m)| options.group_field.value(doc, m)),
        );
        let brightness =
            BrightnessScale::new(metrics.iter().map(|m| m.media_count_adjusted));
        log::debug!(
            "Rendering {} documents in {}x{} ({} groups, media domain {:?})",
            documents.len(),
            options.width,
            options.height,
            colors.len(),
            brightness.domain()
        );

        let leaves: Vec<Leaf> = layout_documents(&documents, &metrics, options.width, options.height)
            .into_iter()
            .map(|node| {
                let raw = format!(
                    "{} - {}",
                    options.label_field.value(node.document, node.metrics),
                    node.document.title
                );
                Leaf {
                    document: node.index,
                    origin: Pos2::new(node.x0, node.y0),
                    size: Vec2::new(node.width(), node.height()),
                    fill: brightness.color(node.metrics.media_count_adjusted),
                    group_color: colors
                        .color(&options.group_field.value(node.document, node.metrics)),
                    label: fit_text(&raw, node.width() - LABEL_INSET, measure),
                    value: options.value_field.value(node.document, node.metrics),
                }
            })
            .collect();

        let container = ContainerTransform::centered(options.width, options.height, &options.margin);
        let animation = EntranceAnimation::start(now, options.play_animation);
        let tooltip = TooltipController::new(options.tooltip.style);

        Ok(Self {
            options,
            documents,
            metrics,
            leaves,
            container,
            animation,
            tooltip,
            hovered: None,
        })
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn metrics(&self) -> &[DerivedMetrics] {
        &self.metrics
    }

    /// Groups in draw order (largest first).
    pub fn leaves(&self) -> &[Leaf] {
        &self.leaves
    }

    pub fn width(&self) -> f32 {
        self.options.width
    }

    pub fn height(&self) -> f32 {
        self.options.height
    }

    pub fn view_box(&self) -> [f32; 4] {
        [0.0, 0.0, self.options.width, self.options.height]
    }

    pub fn tooltip(&self) -> &TooltipController {
        &self.tooltip
    }

    pub fn tooltip_mut(&mut self) -> &mut TooltipController {
        &mut self.tooltip
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn frame(&self, now: f64) -> ChartFrame<'_> {
        let state = self.animation.state(now);
        let container = self.container.with_scale(state.zoom);
        let leaves = self
            .leaves
            .iter()
            .map(|leaf| LeafFrame {
                leaf,
                rect: container.apply_rect(Self::grown_rect(leaf, state.grow)),
                label_pos: container.apply(leaf.origin + leaf.size / 2.0),
                label_opacity: state.label_opacity,
                font_size: FONT_SIZE * state.zoom,
            })
            .collect();

        ChartFrame {
            state,
            container,
            leaves,
        }
    }

    fn grown_rect(leaf: &Leaf, grow: f32) -> UiRect {
        let g = AnimRect::grown(leaf.size.x, leaf.size.y, grow);
        UiRect::from_min_size(leaf.origin + Vec2::new(g.x, g.y), Vec2::new(g.w, g.h))
    }

    /// Document under `canvas_pos`, hit-testing the geometry as drawn at `now`.
    pub fn document_at(&self, canvas_pos: Pos2, now: f64) -> Option<usize> {
        let state = self.animation.state(now);
        let local = self.container.with_scale(state.zoom).invert(canvas_pos)?;
        self.leaves
            .iter()
            .find(|leaf| Self::grown_rect(leaf, state.grow).contains(local))
            .map(|leaf| leaf.document)
    }

    /// Feed a pointer position. `canvas_pos` is `None` when the pointer is off the surface;
    /// `page_pos` and `viewport` place the tooltip.
    pub fn pointer_moved(
        &mut self,
        canvas_pos: Option<Pos2>,
        page_pos: Pos2,
        viewport: Vec2,
        now: f64,
    ) {
        let hit = canvas_pos.and_then(|pos| self.document_at(pos, now));
        match (self.hovered, hit) {
            (Some(current), Some(next)) if current == next => {
                self.tooltip.move_to(page_pos, viewport);
            }
            (_, Some(next)) => self.show_tooltip(next, page_pos, viewport, now),
            (Some(_), None) => self.tooltip.hide(now),
            (None, None) => {}
        }
        self.hovered = hit;
    }

    pub fn show_tooltip(&mut self, document: usize, page_pos: Pos2, viewport: Vec2, now: f64) {
        let (Some(doc), Some(metrics)) = (self.documents.get(document), self.metrics.get(document))
        else {
            return;
        };
        let content = (self.options.tooltip.content)(doc, metrics);
        self.tooltip.show(document, content, page_pos, viewport, now);
    }

    pub fn hide_tooltip(&mut self, now: f64) {
        self.hovered = None;
        self.tooltip.hide(now);
    }

    /// Click at `canvas_pos`; `None` when no leaf is there.
    pub fn click(&self, canvas_pos: Pos2, now: f64) -> Option<ClickOutcome> {
        let document = self.document_at(canvas_pos, now)?;
        self.activate(document)
    }

    pub fn activate(&self, document: usize) -> Option<ClickOutcome> {
        let doc = self.documents.get(document)?;
        match &self.options.tooltip.on_click {
            Some(handler) => {
                handler(doc);
                Some(ClickOutcome::Handled)
            }
            None => Some(ClickOutcome::OpenLink(doc.link.clone())),
        }
    }

    /// Advance time-driven state; call once per frame.
    pub fn update(&mut self, now: f64) {
        self.tooltip.update(now);
    }

    pub fn needs_repaint(&self, now: f64) -> bool {
        self.animation.is_animating(now) || self.tooltip.is_transitioning(now)
    }

    /// Jump the entrance to its final frame.
    pub fn finish_animation(&mut self) {
        self.animation.finish_immediately();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Metrics, Multimedia, Ranking};
    use crate::text_fit::DeterministicTextMeasure;
    use crate::tooltip::TooltipPhase;
    use std::sync::{Arc, Mutex};

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 900.0);

    fn doc(title: &str, rank: f64, lang: &str, img: u64, video: u64, audio: u64) -> Document {
        Document {
            title: title.to_string(),
            snippet: format!("about {title}"),
            link: format!("https://example.com/{title}"),
            metrics: Some(Metrics {
                ranking: Some(Ranking::Number(rank)),
                language: Some(lang.to_string()),
                multimedia: Some(Multimedia {
                    img: Some(img as f64),
                    video: Some(video as f64),
                    audio: Some(audio as f64),
                }),
            }),
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            documents: vec![
                doc("alpha", 1.0, "en", 4, 0, 0),
                doc("beta", 2.0, "es", 0, 0, 0),
                doc("gamma", 3.0, "en", 1, 1, 0),
            ],
        }
    }

    fn render(data: &Dataset, options: RenderOptions) -> TreemapChart {
        TreemapChart::render(Some(data), options, &DeterministicTextMeasure::default(), 0.0)
            .unwrap()
    }

    fn static_options() -> RenderOptions {
        RenderOptions::default().with_play_animation(false)
    }

    #[test]
    fn test_missing_data_aborts() {
        let result = TreemapChart::render(
            None,
            RenderOptions::default(),
            &DeterministicTextMeasure::default(),
            0.0,
        );
        assert!(matches!(result, Err(Error::MissingData)));
    }

    #[test]
    fn test_static_render_three_groups() {
        let data = dataset();
        let chart = render(&data, static_options());

        assert_eq!(chart.leaves().len(), 3);
        assert_eq!(chart.view_box(), [0.0, 0.0, 1000.0, 800.0]);
        let frame = chart.frame(0.0);
        assert_eq!(frame.state, AnimationState::FINAL);
        for lf in &frame.leaves {
            assert!(lf.rect.width() > 0.0 && lf.rect.height() > 0.0);
            assert!(!lf.leaf.label.is_empty());
            assert_eq!(lf.label_opacity, 1.0);
            let drawn = lf.rect.min - lf.leaf.rect().min;
            assert!(drawn.length() < 1e-3);
            assert!((lf.rect.size() - lf.leaf.size).length() < 1e-3);
        }
        assert!(!chart.needs_repaint(0.0));
    }

    #[test]
    fn test_input_not_mutated() {
        let data = dataset();
        let before = data.clone();
        let chart = render(&data, static_options());
        assert_eq!(data, before);
        assert_eq!(chart.metrics()[0].media_count_adjusted, 5.0);
        assert_eq!(chart.metrics()[1].media_count_adjusted, 1.0);
    }

    #[test]
    fn test_leaves_largest_first_with_labels() {
        let data = dataset();
        let chart = render(&data, static_options());
        let order: Vec<usize> = chart.leaves().iter().map(|l| l.document).collect();
        assert_eq!(order, vec![0, 2, 1]);
        assert_eq!(chart.leaves()[0].label, "1 - alpha");
        assert_eq!(chart.leaves()[0].value, "4");
    }

    #[test]
    fn test_fill_and_group_colors() {
        let data = dataset();
        let chart = render(&data, static_options());
        let leaf = |d: usize| chart.leaves().iter().find(|l| l.document == d).unwrap();

        assert_ne!(leaf(0).fill, leaf(1).fill);
        assert_eq!(leaf(0).group_color, leaf(2).group_color);
        assert_ne!(leaf(0).group_color, leaf(1).group_color);

        let flat = Dataset {
            documents: vec![
                doc("a", 1.0, "en", 0, 0, 0),
                doc("b", 2.0, "en", 0, 0, 0),
                doc("c", 3.0, "en", 0, 0, 0),
            ],
        };
        let chart = render(&flat, static_options());
        let fills: Vec<Color32> = chart.leaves().iter().map(|l| l.fill).collect();
        assert!(fills.iter().all(|f| *f == fills[0]));
    }

    #[test]
    fn test_long_labels_are_fitted() {
        let data = Dataset {
            documents: vec![
                doc(&"very long title ".repeat(20), 1.0, "en", 50, 0, 0),
                doc("tiny", 2.0, "en", 0, 0, 0),
            ],
        };
        let measure = DeterministicTextMeasure::default();
        let chart = render(&data, static_options());
        for leaf in chart.leaves() {
            assert!(measure.width(&leaf.label) <= leaf.size.x - 6.0 || leaf.label == "…");
        }
        assert!(chart.leaves()[0].label.ends_with('…'));
    }

    #[test]
    fn test_animated_first_frame() {
        let data = dataset();
        let chart = render(&data, RenderOptions::default());
        assert!(chart.needs_repaint(0.0));

        let frame = chart.frame(0.0);
        assert!((frame.state.zoom - 0.01).abs() < 1e-6);
        for lf in &frame.leaves {
            assert_eq!(lf.rect.width(), 0.0);
            assert_eq!(lf.label_opacity, 0.0);
            // collapsed on the leaf's own midpoint
            let mid = frame.container.apply(lf.leaf.rect().center());
            assert!((lf.rect.center() - mid).length() < 1e-3);
        }

        let done = chart.frame(3.0);
        assert_eq!(done.state, AnimationState::FINAL);
        assert!(!chart.needs_repaint(3.0));
    }

    #[test]
    fn test_hover_shows_and_hides_tooltip() {
        let data = dataset();
        let mut chart = render(&data, static_options());
        let target = chart.leaves()[0].rect().center();
        let page = Pos2::new(200.0, 150.0);

        chart.pointer_moved(Some(target), page, VIEWPORT, 0.0);
        assert_eq!(chart.hovered(), Some(0));
        assert_eq!(chart.tooltip().document(), Some(0));
        assert_eq!(chart.tooltip().content().heading, "1-alpha");
        assert_eq!(chart.tooltip().phase(0.1), TooltipPhase::Showing);
        assert!(chart.needs_repaint(0.1));

        chart.pointer_moved(Some(target), Pos2::new(220.0, 160.0), VIEWPORT, 0.3);
        assert_eq!(chart.tooltip().position(), Pos2::new(230.0, 170.0));

        chart.pointer_moved(None, page, VIEWPORT, 1.0);
        assert_eq!(chart.hovered(), None);
        assert_eq!(chart.tooltip().phase(1.1), TooltipPhase::Hiding);
        chart.update(1.6);
        assert!(!chart.tooltip().is_displayed());
    }

    #[test]
    fn test_hover_switches_documents() {
        let data = dataset();
        let mut chart = render(&data, static_options());
        let first = chart.leaves()[0].rect().center();
        let second = chart.leaves()[1].rect().center();

        chart.pointer_moved(Some(first), Pos2::ZERO, VIEWPORT, 0.0);
        chart.pointer_moved(Some(second), Pos2::ZERO, VIEWPORT, 0.1);
        let expected = chart.leaves()[1].document;
        assert_eq!(chart.tooltip().document(), Some(expected));
        assert_eq!(chart.tooltip().phase(0.2), TooltipPhase::Showing);
    }

    #[test]
    fn test_hide_tooltip_clears_hover() {
        let data = dataset();
        let mut chart = render(&data, static_options());
        let target = chart.leaves()[0].rect().center();
        chart.pointer_moved(Some(target), Pos2::ZERO, VIEWPORT, 0.0);
        chart.update(0.3);

        chart.hide_tooltip(1.0);
        assert_eq!(chart.hovered(), None);
        assert_eq!(chart.tooltip().phase(1.1), TooltipPhase::Hiding);
        chart.update(1.6);
        assert!(!chart.tooltip().is_displayed());

        // the same leaf shows again on the next move
        chart.pointer_moved(Some(target), Pos2::ZERO, VIEWPORT, 2.0);
        assert_eq!(chart.tooltip().phase(2.1), TooltipPhase::Showing);
    }

    #[test]
    fn test_finish_animation_jumps_to_final() {
        let data = dataset();
        let mut chart = render(&data, RenderOptions::default());
        assert!(chart.needs_repaint(0.5));

        chart.finish_animation();
        assert_eq!(chart.frame(0.5).state, AnimationState::FINAL);
        assert!(!chart.needs_repaint(0.5));
        let target = chart.leaves()[0].rect().center();
        assert_eq!(chart.document_at(target, 0.5), Some(0));
    }

    #[test]
    fn test_gaps_are_not_hits() {
        let data = dataset();
        let chart = render(&data, static_options());
        assert_eq!(chart.document_at(Pos2::new(0.5, 0.5), 0.0), None);
    }

    #[test]
    fn test_click_defaults_to_open_link() {
        let data = dataset();
        let chart = render(&data, static_options());
        let target = chart.leaves()[0].rect().center();
        assert_eq!(
            chart.click(target, 0.0),
            Some(ClickOutcome::OpenLink("https://example.com/alpha".to_string()))
        );
        assert_eq!(chart.click(Pos2::new(-10.0, -10.0), 0.0), None);
    }

    #[test]
    fn test_click_handler() {
        let clicked = Arc::new(Mutex::new(Vec::new()));
        let sink = clicked.clone();
        let options = static_options().with_on_click(move |doc| {
            sink.lock().unwrap().push(doc.title.clone());
        });

        let data = dataset();
        let chart = render(&data, options);
        let target = chart.leaves()[1].rect().center();
        assert_eq!(chart.click(target, 0.0), Some(ClickOutcome::Handled));
        assert_eq!(*clicked.lock().unwrap(), vec!["gamma".to_string()]);
    }

    #[test]
    fn test_rerender_starts_clean() {
        let data = dataset();
        let mut chart = render(&data, static_options());
        let target = chart.leaves()[0].rect().center();
        chart.pointer_moved(Some(target), Pos2::ZERO, VIEWPORT, 0.0);
        assert!(chart.tooltip().is_displayed());

        let smaller = Dataset {
            documents: vec![doc("solo", 1.0, "en", 0, 0, 0)],
        };
        let chart = render(&smaller, static_options());
        assert_eq!(chart.leaves().len(), 1);
        assert!(!chart.tooltip().is_displayed());
        assert_eq!(chart.hovered(), None);
    }

    #[test]
    fn test_custom_tooltip_content() {
        let options = static_options().with_tooltip_content(|doc, m| crate::options::TooltipContent {
            heading: doc.title.to_uppercase(),
            body: String::new(),
            rows: vec![("media".into(), m.media_count.to_string())],
        });
        let data = dataset();
        let mut chart = render(&data, options);
        chart.show_tooltip(0, Pos2::ZERO, VIEWPORT, 0.0);
        assert_eq!(chart.tooltip().content().heading, "ALPHA");
        assert_eq!(chart.tooltip().content().rows[0].1, "4");
    }
}
