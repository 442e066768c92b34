/// A conditional-expression macro.  Rust's `if` is already an
/// expression, but `cargo fmt` insists on breaking it across several
/// lines, and the table of border rules in the energy code reads much
/// better when each case fits on one line.
#[macro_export]
macro_rules! cq {
    ($condition: expr, $_true: expr, $_false: expr) => {
        if $condition {
            $_true
        } else {
            $_false
        }
    };
}
