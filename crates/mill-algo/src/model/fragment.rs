use super::linear::{LinearModel, VarId};

/// Link `z` to the product `q·x` for binary `x` and `0 <= q <= big_m`.
///
/// Adds `z <= M·x`, `z <= q + M(1 - x)` and `z >= q - M(1 - x)`; the caller
/// declares `z >= 0` as a variable bound. At integral `x` this pins `z` to
/// `q` (`x = 1`) or `0` (`x = 0`).
pub fn price_link(model: &mut LinearModel, tag: &str, q: VarId, x: VarId, z: VarId, big_m: f64) {
    model.add_le(format!("link_off_{tag}"), vec![(z, 1.0), (x, -big_m)], 0.0);
    model.add_le(
        format!("link_hi_{tag}"),
        vec![(z, 1.0), (q, -1.0), (x, big_m)],
        big_m,
    );
    model.add_ge(
        format!("link_lo_{tag}"),
        vec![(z, 1.0), (q, -1.0), (x, -big_m)],
        -big_m,
    );
}
