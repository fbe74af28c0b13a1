use super::{ArrangeContext, Arrangement, Layout, master_stack_columns, split_slots, stack_vertically};

pub struct TilingLayout;

impl Layout for TilingLayout {
    fn symbol(&self) -> &'static str {
        "[]="
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
        let (stack_sizes, stack_extra) = split_slots(
            columns.stack.height,
            columns.stack_count,
            gap,
            context.stack_extra,
            context.min_slot_height,
        );

        let mut geometries = stack_vertically(columns.master, &master_sizes, gap);
        geometries.extend(stack_vertically(columns.stack, &stack_sizes, gap));

        Arrangement {
            geometries,
            symbol: self.symbol().to_string(),
            master_extra,
            stack_extra,
        }
    }
}
