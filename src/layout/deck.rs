use super::{ArrangeContext, Arrangement, Layout, master_stack_columns, split_slots, stack_vertically};

/// Master column as in tile; every stack client gets the whole stack column
/// so only the first one in list order is visible.
pub struct DeckLayout;

impl Layout for DeckLayout {
    fn symbol(&self) -> &'static str {
        "[D]"
    }

    fn annotated_symbol(&self, tiled_count: usize, context: &ArrangeContext) -> String {
        let stack_count = tiled_count.saturating_sub(context.num_master);
        if stack_count > 0 {
            format!("[D {}]", stack_count)
        } else {
            self.symbol().to_string()
        }
    }

    fn arrange(&self, tiled_count: usize, context: &ArrangeContext) -> Arrangement {
        let columns = master_stack_columns(tiled_count, context);
        let gap = context.gaps.inner_vertical;

        let (master_sizes, master_extra) = split_slots(
            columns.master.height,
            columns.master_count,
            gap,
            context.master_extra,
            context.min_slot_height,
        );

        let mut geometries = stack_vertically(columns.master, &master_sizes, gap);
        geometries.extend(std::iter::repeat_n(columns.stack, columns.stack_count));

        Arrangement {
            geometries,
            symbol: self.annotated_symbol(tiled_count, context),
            master_extra,
            stack_extra: context.stack_extra,
        }
    }
}
