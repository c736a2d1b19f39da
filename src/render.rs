use crate::config::RenderConfig;
use crate::geometry::{Point, Rect};
use crate::ir::{DetailLevel, VisualizationEdge, VisualizationNode};
use crate::session::DiagramSession;
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

const MIN_CANVAS: f32 = 200.0;
const FALLBACK_NODE_SIZE: f32 = 40.0;
/// Rough glyph advance relative to font size, for label backgrounds.
const CHAR_WIDTH_RATIO: f32 = 0.6;

/// Paint the session's current nodes, routed edges and selection as SVG.
pub fn render_svg(session: &DiagramSession) -> String {
    let config = session.config();
    let theme = &config.theme;
    let icon_size = config.nodes.icon_size;
    let nodes = session.nodes();

    let shapes: Vec<Rect> = nodes.iter().map(|n| node_shape(n, icon_size)).collect();
    let edges: Vec<&VisualizationEdge> = session.routed_edges().collect();
    let canvas = canvas_bounds(&shapes, &edges, &config.render);

    let mut svg = String::new();
    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{:.2}\" height=\"{:.2}\" viewBox=\"{:.2} {:.2} {:.2} {:.2}\">",
        canvas.width, canvas.height, canvas.x, canvas.y, canvas.width, canvas.height
    ));
    svg.push_str(&format!(
        "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        canvas.x, canvas.y, config.render.background
    ));
    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str("</defs>");

    for (node, shape) in nodes.iter().zip(&shapes) {
        let selected = session.selection().contains(&node.id);
        push_node(&mut svg, node, shape, selected, theme);
    }

    for edge in &edges {
        push_edge(&mut svg, edge, theme);
    }

    svg.push_str("</svg>");
    svg
}

/// Drawn rectangle of a node: icon-size square at `Icon` detail, the
/// measured bounds otherwise.
fn node_shape(node: &VisualizationNode, icon_size: f32) -> Rect {
    let rect = node.bounds.unwrap_or(Rect::new(
        node.position.x,
        node.position.y,
        FALLBACK_NODE_SIZE,
        FALLBACK_NODE_SIZE,
    ));
    if node.detail != DetailLevel::Icon {
        return rect;
    }
    rect.centered_square(icon_size)
}

fn canvas_bounds(shapes: &[Rect], edges: &[&VisualizationEdge], render: &RenderConfig) -> Rect {
    let mut min = Point::new(f32::INFINITY, f32::INFINITY);
    let mut max = Point::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
    let mut include = |p: Point| {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    };
    for rect in shapes {
        include(Point::new(rect.x, rect.y));
        include(Point::new(rect.right(), rect.bottom()));
    }
    for edge in edges {
        for &p in &edge.waypoints {
            include(p);
        }
    }
    if !min.x.is_finite() || !max.x.is_finite() {
        return Rect::new(0.0, 0.0, render.width, render.height);
    }
    let pad = render.padding;
    Rect::new(
        min.x - pad,
        min.y - pad,
        (max.x - min.x + pad * 2.0).max(MIN_CANVAS),
        (max.y - min.y + pad * 2.0).max(MIN_CANVAS),
    )
}

fn push_node(svg: &mut String, node: &VisualizationNode, shape: &Rect, selected: bool, theme: &Theme) {
    let (stroke, stroke_width) = if selected {
        (theme.selection_color.as_str(), 2.5)
    } else {
        (theme.border_color.as_str(), 1.2)
    };
    svg.push_str(&format!(
        "<rect data-id=\"{}\" x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"{:.2}\" ry=\"{:.2}\" fill=\"{}\" stroke=\"{}\" stroke-width=\"{}\"/>",
        escape_xml(&node.id),
        shape.x,
        shape.y,
        shape.width,
        shape.height,
        node.corner_radius,
        node.corner_radius,
        theme.fill_for(node.kind),
        stroke,
        stroke_width
    ));

    match node.detail {
        DetailLevel::Icon => {}
        DetailLevel::Compact => {
            let center = shape.center();
            svg.push_str(&format!(
                "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                center.x,
                center.y,
                theme.font_family,
                theme.font_size,
                theme.primary_text_color,
                escape_xml(&node.data.label)
            ));
        }
        DetailLevel::Detailed => {
            let x = shape.x + 10.0;
            let y = shape.y + theme.font_size + 6.0;
            svg.push_str(&format!(
                "<text x=\"{x:.2}\" y=\"{y:.2}\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
                theme.font_family,
                theme.font_size,
                theme.primary_text_color,
                escape_xml(&node.data.label)
            ));
            if let Some(status) = &node.data.status {
                let status_y = y + theme.font_size * 1.3;
                svg.push_str(&format!(
                    "<text x=\"{x:.2}\" y=\"{status_y:.2}\" font-family=\"{}\" font-size=\"{:.1}\" fill=\"{}\" opacity=\"0.7\">{}</text>",
                    theme.font_family,
                    theme.font_size * 0.85,
                    theme.primary_text_color,
                    escape_xml(status)
                ));
            }
        }
    }
}

fn push_edge(svg: &mut String, edge: &VisualizationEdge, theme: &Theme) {
    let Some(d) = edge.path.as_deref() else {
        return;
    };
    let opacity = if edge.data.hidden {
        theme.hidden_edge_opacity
    } else {
        1.0
    };
    svg.push_str(&format!(
        "<path data-id=\"{}\" d=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" opacity=\"{}\" marker-end=\"url(#arrow)\" />",
        escape_xml(&edge.id),
        d,
        theme.line_color,
        opacity
    ));

    if edge.data.hidden {
        return;
    }
    if let (Some(label), Some(anchor)) = (&edge.data.label, edge.label_anchor) {
        let width = label.chars().count() as f32 * theme.font_size * CHAR_WIDTH_RATIO + 8.0;
        let height = theme.font_size + 6.0;
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{width:.2}\" height=\"{height:.2}\" rx=\"3\" ry=\"3\" fill=\"{}\" opacity=\"0.9\"/>",
            anchor.x - width / 2.0,
            anchor.y - height / 2.0,
            theme.edge_label_background
        ));
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            anchor.x,
            anchor.y,
            theme.font_family,
            theme.font_size,
            theme.primary_text_color,
            escape_xml(label)
        ));
    }
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .map(|f| f.trim().trim_matches('"').to_string())
        .unwrap_or_default();
    if let Some(size) = usvg::Size::from_wh(render_cfg.width, render_cfg.height) {
        opt.default_size = size;
    }

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
