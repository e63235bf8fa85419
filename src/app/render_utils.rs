use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2, vec2};

use super::graph::ViewTransform;

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let inverse = 1.0 - amount;

    Color32::from_rgba_unmultiplied(
        ((base.r() as f32 * inverse) + (overlay.r() as f32 * amount)) as u8,
        ((base.g() as f32 * inverse) + (overlay.g() as f32 * amount)) as u8,
        ((base.b() as f32 * inverse) + (overlay.b() as f32 * amount)) as u8,
        ((base.a() as f32 * inverse) + (overlay.a() as f32 * amount)) as u8,
    )
}

pub(super) fn with_opacity(color: Color32, opacity: f32) -> Color32 {
    let opacity = opacity.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        color.r(),
        color.g(),
        color.b(),
        (color.a() as f32 * opacity) as u8,
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect, transform: ViewTransform) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(19, 23, 29));

    let step = (64.0 * transform.scale).max(16.0);
    let origin = rect.min + transform.translate;

    let mut x = origin.x.rem_euclid(step);
    while x < rect.right() {
        painter.line_segment(
            [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        x += step;
    }

    let mut y = origin.y.rem_euclid(step);
    while y < rect.bottom() {
        painter.line_segment(
            [Pos2::new(rect.left(), y), Pos2::new(rect.right(), y)],
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(60, 70, 80, 70)),
        );
        y += step;
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

/// Clips the segment against `rect` grown by `padding` (Liang-Barsky).
pub(super) fn edge_visible(rect: Rect, start: Pos2, end: Pos2, padding: f32) -> bool {
    let bounds = rect.expand(padding);
    let delta = end - start;
    let (mut enter, mut exit) = (0.0_f32, 1.0_f32);

    let planes = [
        (-delta.x, start.x - bounds.left()),
        (delta.x, bounds.right() - start.x),
        (-delta.y, start.y - bounds.top()),
        (delta.y, bounds.bottom() - start.y),
    ];
    for (p, q) in planes {
        if p == 0.0 {
            if q < 0.0 {
                return false;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
        if enter > exit {
            return false;
        }
    }
    true
}

/// Triangle for a directed edge, tip resting on the target's rim.
pub(super) fn arrowhead(start: Pos2, end: Pos2, target_radius: f32, size: f32) -> Option<[Pos2; 3]> {
    let offset = end - start;
    let length = offset.length();
    if length <= target_radius + size {
        return None;
    }

    let direction = offset / length;
    let tip = end - direction * target_radius;
    let base = tip - direction * size;
    let normal = Vec2::new(-direction.y, direction.x) * (size * 0.5);
    Some([tip, base + normal, base - normal])
}

pub(super) const HOVER_LABEL_PADDING: Vec2 = vec2(6.0, 3.0);
const HOVER_LABEL_GAP: f32 = 6.0;

/// Box for the hover label: centered over the node, bottom edge a small gap
/// above its rim, sized to the measured text plus padding.
pub(super) fn hover_label_rect(position: Pos2, radius: f32, text_size: Vec2) -> Rect {
    let size = text_size + HOVER_LABEL_PADDING * 2.0;
    let bottom = position.y - radius - HOVER_LABEL_GAP;
    Rect::from_min_size(Pos2::new(position.x - size.x * 0.5, bottom - size.y), size)
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    #[test]
    fn arrowhead_touches_the_target_rim() {
        let [tip, left, right] = arrowhead(pos2(0.0, 0.0), pos2(100.0, 0.0), 10.0, 8.0).unwrap();

        assert_eq!(tip, pos2(90.0, 0.0));
        assert_eq!(left.x, 82.0);
        assert_eq!(right.x, 82.0);
        assert!(arrowhead(pos2(0.0, 0.0), pos2(12.0, 0.0), 10.0, 8.0).is_none());
    }

    #[test]
    fn hover_label_sits_centered_above_the_node() {
        let position = pos2(200.0, 150.0);
        let label = hover_label_rect(position, 10.0, vec2(48.0, 14.0));

        assert!(label.bottom() < position.y - 10.0);
        assert_eq!(label.bottom(), 134.0);
        assert_eq!(label.center().x, position.x);
        assert_eq!(label.size(), vec2(60.0, 20.0));
    }

    #[test]
    fn hover_label_follows_the_node() {
        let before = hover_label_rect(pos2(0.0, 0.0), 5.0, vec2(30.0, 12.0));
        let after = hover_label_rect(pos2(40.0, -25.0), 5.0, vec2(30.0, 12.0));

        assert_eq!(after.min - before.min, vec2(40.0, -25.0));
        assert_eq!(after.size(), before.size());
    }

    #[test]
    fn edge_crossing_the_view_is_visible() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));

        assert!(edge_visible(rect, pos2(-50.0, 50.0), pos2(150.0, 50.0), 0.0));
        assert!(!edge_visible(rect, pos2(-50.0, -10.0), pos2(-10.0, -50.0), 0.0));
        assert!(!edge_visible(rect, pos2(-5.0, 120.0), pos2(-5.0, -20.0), 2.0));
        assert!(edge_visible(rect, pos2(-1.0, 120.0), pos2(-1.0, -20.0), 2.0));
    }

    #[test]
    fn circles_just_off_screen_stay_visible_within_their_radius() {
        let rect = Rect::from_min_max(pos2(0.0, 0.0), pos2(100.0, 100.0));

        assert!(circle_visible(rect, pos2(-4.0, 50.0), 5.0));
        assert!(!circle_visible(rect, pos2(-6.0, 50.0), 5.0));
    }
}
