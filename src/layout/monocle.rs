use super::{ArrangeContext, Arrangement, Layout};

pub struct MonocleLayout;

impl Layout for MonocleLayout {
    fn symbol(&self) -> &'static str {
        "[M]"
    }

    fn annotated_symbol(&self, tiled_count: usize, _context: &ArrangeContext) -> String {
        format!("[{}]", tiled_count)
    }

    fn arrange(&self, tiled_count: usize, context: &ArrangeContext) -> Arrangement {
        let gaps = context.gaps;
        let geometry = context.area.inset(gaps.outer_horizontal, gaps.outer_vertical);

        Arrangement {
            geometries: vec![geometry; tiled_count],
            symbol: self.annotated_symbol(tiled_count, context),
            master_extra: context.master_extra,
            stack_extra: context.stack_extra,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::context;
    use super::super::{GapConfig, LayoutType, WindowGeometry};
    use super::*;

    #[test]
    fn every_client_gets_the_gapped_area() {
        let mut ctx = context(800, 600);
        ctx.gaps = GapConfig {
            outer_horizontal: 5,
            outer_vertical: 8,
            ..GapConfig::default()
        };

        let arrangement = MonocleLayout.arrange(3, &ctx);

        assert_eq!(arrangement.geometries, vec![WindowGeometry::new(5, 8, 790, 584); 3]);
        assert_eq!(arrangement.symbol, "[3]");
    }

    #[test]
    fn symbol_counts_a_single_client() {
        let arrangement = LayoutType::Monocle.arrange(1, &context(800, 600));
        assert_eq!(arrangement.map(|a| a.symbol), Some("[1]".to_string()));
    }
}
