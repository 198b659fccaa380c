/// Returns the decision-variable name for a robot's `qderiv`-th derivative.
///
/// The name is `"{robot}/"` followed by `qderiv` copies of `d` and a final
/// `q`, so order 2 of `"arm"` is `"arm/ddq"`. Distinct orders of the same
/// robot always give distinct names.
#[must_use]
pub fn state_name(robot: &str, qderiv: usize) -> String {
    format!("{robot}/{}q", "d".repeat(qderiv))
}
