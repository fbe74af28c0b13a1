pub mod deck;
pub mod monocle;
pub mod tiling;

use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WindowGeometry {
    pub x_coordinate: i32,
    pub y_coordinate: i32,
    pub width: i32,
    pub height: i32,
}

impl WindowGeometry {
    pub const fn new(x_coordinate: i32, y_coordinate: i32, width: i32, height: i32) -> Self {
        Self {
            x_coordinate,
            y_coordinate,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x_coordinate + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y_coordinate + self.height
    }

    pub fn intersection_area(&self, other: &WindowGeometry) -> i32 {
        let width = self.right().min(other.right()) - self.x_coordinate.max(other.x_coordinate);
        let height = self.bottom().min(other.bottom()) - self.y_coordinate.max(other.y_coordinate);
        width.max(0) * height.max(0)
    }

    /// Shrinks the box by `horizontal` on the left and right edges and by
    /// `vertical` on the top and bottom edges.
    pub fn inset(&self, horizontal: i32, vertical: i32) -> Self {
        Self {
            x_coordinate: self.x_coordinate + horizontal,
            y_coordinate: self.y_coordinate + vertical,
            width: self.width - 2 * horizontal,
            height: self.height - 2 * vertical,
        }
    }
}

/// Pixel gaps. Horizontal gaps separate columns and the left/right screen
/// edges, vertical gaps separate rows and the top/bottom edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GapConfig {
    pub inner_horizontal: i32,
    pub inner_vertical: i32,
    pub outer_horizontal: i32,
    pub outer_vertical: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LayoutType {
    Tile,
    Deck,
    Monocle,
    Floating,
}

impl LayoutType {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Tile => tiling::TilingLayout.symbol(),
            Self::Deck => deck::DeckLayout.symbol(),
            Self::Monocle => monocle::MonocleLayout.symbol(),
            Self::Floating => "><>",
        }
    }

    /// Floating has no arrange function; clients keep their own geometry.
    pub fn is_tiling(&self) -> bool {
        !matches!(self, Self::Floating)
    }

    /// Layouts that hide tiled clients behind one another and therefore
    /// want the tab bar in `TabMode::Auto`.
    pub fn stacks_clients(&self) -> bool {
        matches!(self, Self::Deck | Self::Monocle)
    }

    /// Computes the outer boxes (border included) for `tiled_count` clients
    /// in list order. Returns `None` for layouts without an arrange function.
    pub fn arrange(&self, tiled_count: usize, context: &ArrangeContext) -> Option<Arrangement> {
        let layout: &dyn Layout = match self {
            Self::Tile => &tiling::TilingLayout,
            Self::Deck => &deck::DeckLayout,
            Self::Monocle => &monocle::MonocleLayout,
            Self::Floating => return None,
        };

        if tiled_count == 1 {
            return Some(Arrangement {
                geometries: vec![context.area],
                symbol: layout.annotated_symbol(1, context),
                master_extra: context.master_extra,
                stack_extra: context.stack_extra,
            });
        }

        Some(layout.arrange(tiled_count, context))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ArrangeContext {
    pub area: WindowGeometry,
    pub num_master: usize,
    pub master_factor: f32,
    pub gaps: GapConfig,
    pub master_extra: i32,
    pub stack_extra: i32,
    pub min_slot_height: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    pub geometries: Vec<WindowGeometry>,
    pub symbol: String,
    /// Extra-pixel adjustments after clamping; callers store these back.
    pub master_extra: i32,
    pub stack_extra: i32,
}

pub trait Layout {
    fn arrange(&self, tiled_count: usize, context: &ArrangeContext) -> Arrangement;
    fn symbol(&self) -> &'static str;

    fn annotated_symbol(&self, _tiled_count: usize, _context: &ArrangeContext) -> String {
        self.symbol().to_string()
    }
}

pub(crate) struct Columns {
    pub master: WindowGeometry,
    pub stack: WindowGeometry,
    pub master_count: usize,
    pub stack_count: usize,
}

/// Splits the gapped work area into a master and a stack column. Without a
/// stack the master column spans the full width, and vice versa.
pub(crate) fn master_stack_columns(tiled_count: usize, context: &ArrangeContext) -> Columns {
    let gaps = context.gaps;
    let inner = context.area.inset(gaps.outer_horizontal, gaps.outer_vertical);
    let master_count = context.num_master.min(tiled_count);
    let stack_count = tiled_count - master_count;

    if master_count > 0 && stack_count > 0 {
        let shared = inner.width - gaps.inner_horizontal;
        let master_width = (shared as f32 * context.master_factor) as i32;
        let stack_width = shared - master_width;

        Columns {
            master: WindowGeometry::new(
                inner.x_coordinate,
                inner.y_coordinate,
                master_width,
                inner.height,
            ),
            stack: WindowGeometry::new(
                inner.x_coordinate + master_width + gaps.inner_horizontal,
                inner.y_coordinate,
                stack_width,
                inner.height,
            ),
            master_count,
            stack_count,
        }
    } else {
        Columns {
            master: inner,
            stack: inner,
            master_count,
            stack_count,
        }
    }
}

/// Divides `total` pixels into `count` slots separated by `gap`.
///
/// Without an adjustment the slots are even, the first `remainder` slots
/// taking one extra pixel. A non-zero `extra` grows (or shrinks) the first
/// slot; it is clamped so every other slot keeps at least `min_slot` pixels,
/// and the clamped value is returned alongside the sizes. The sizes plus the
/// gaps always add up to `total`.
pub fn split_slots(total: i32, count: usize, gap: i32, extra: i32, min_slot: i32) -> (Vec<i32>, i32) {
    if count == 0 {
        return (Vec::new(), extra);
    }

    let slots = count as i32;
    let available = (total - gap * (slots - 1)).max(0);
    if count == 1 {
        return (vec![available], extra);
    }

    let even = available / slots;
    let mut extra = extra;

    if extra != 0 {
        let upper = available - min_slot * (slots - 1);
        if upper < min_slot {
            extra = 0;
        } else {
            extra = (even + extra).clamp(min_slot, upper) - even;
        }
    }

    if extra == 0 {
        let remainder = available % slots;
        let sizes = (0..slots)
            .map(|index| even + i32::from(index < remainder))
            .collect();
        return (sizes, 0);
    }

    let first = even + extra;
    let rest = available - first;
    let others = slots - 1;
    let mut sizes = Vec::with_capacity(count);
    sizes.push(first);
    sizes.extend((0..others).map(|index| rest / others + i32::from(index < rest % others)));
    (sizes, extra)
}

/// Stacks `sizes` top to bottom inside `column`, separated by `gap`.
pub(crate) fn stack_vertically(column: WindowGeometry, sizes: &[i32], gap: i32) -> Vec<WindowGeometry> {
    let mut y = column.y_coordinate;
    sizes
        .iter()
        .map(|&height| {
            let geometry = WindowGeometry::new(column.x_coordinate, y, column.width, height);
            y += height + gap;
            geometry
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;
    use simple_test_case::test_case;

    pub(crate) fn context(width: i32, height: i32) -> ArrangeContext {
        ArrangeContext {
            area: WindowGeometry::new(0, 0, width, height),
            num_master: 1,
            master_factor: 0.55,
            gaps: GapConfig::default(),
            master_extra: 0,
            stack_extra: 0,
            min_slot_height: 32,
        }
    }

    #[test_case(800, 3, 0, vec![267, 267, 266]; "remainder goes to the first slots")]
    #[test_case(800, 2, 10, vec![395, 395]; "gaps are removed first")]
    #[test_case(100, 1, 10, vec![100]; "single slot ignores gap")]
    #[test]
    fn even_split(total: i32, count: usize, gap: i32, expected: Vec<i32>) {
        let (sizes, extra) = split_slots(total, count, gap, 0, 32);
        assert_eq!(sizes, expected);
        assert_eq!(extra, 0);
    }

    #[test]
    fn extra_grows_the_first_slot() {
        let (sizes, extra) = split_slots(800, 2, 0, 100, 32);
        assert_eq!(sizes, vec![500, 300]);
        assert_eq!(extra, 100);
    }

    #[test]
    fn extra_beyond_the_cap_is_clamped() {
        let (sizes, extra) = split_slots(800, 3, 0, 1000, 50);
        assert_eq!(sizes, vec![700, 50, 50]);
        assert_eq!(extra, 700 - 266);
    }

    #[test]
    fn extra_is_dropped_when_nothing_fits() {
        let (sizes, extra) = split_slots(60, 3, 0, 10, 50);
        assert_eq!(sizes, vec![20, 20, 20]);
        assert_eq!(extra, 0);
    }

    #[test]
    fn single_client_fills_the_work_area_for_every_tiling_layout() {
        let mut ctx = context(1280, 800);
        ctx.gaps = GapConfig {
            inner_horizontal: 5,
            inner_vertical: 5,
            outer_horizontal: 10,
            outer_vertical: 10,
        };

        for layout in [LayoutType::Tile, LayoutType::Deck, LayoutType::Monocle] {
            let arrangement = layout.arrange(1, &ctx).expect("tiling layout");
            assert_eq!(arrangement.geometries, vec![ctx.area]);
        }
    }

    #[test]
    fn floating_has_no_arrange_function() {
        assert!(LayoutType::Floating.arrange(3, &context(100, 100)).is_none());
    }

    #[quickcheck]
    fn split_slots_sums_to_total(total: u16, count: u8, gap: u8, extra: i16) -> bool {
        let count = (count % 20) as usize + 1;
        let gap = (gap % 16) as i32;
        let total = total as i32 + gap * count as i32;
        let (sizes, _) = split_slots(total, count, gap, extra as i32, 16);

        sizes.len() == count && sizes.iter().sum::<i32>() + gap * (count as i32 - 1) == total
    }
}
