use std::fmt;

pub fn display_fn(f: impl Fn(&mut fmt::Formatter<'_>) -> fmt::Result) -> impl fmt::Display {
    DisplayFn(f)
}

struct DisplayFn<F>(F);
impl<F> fmt::Display for DisplayFn<F>
where
    F: Fn(&mut fmt::Formatter<'_>) -> fmt::Result,
{
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        (self.0)(formatter)
    }
}

/// Joins the displayed items with `", "`, wrapped in braces.
pub fn display_set<I, T>(items: I) -> impl fmt::Display
where
    I: IntoIterator<Item = T> + Clone,
    T: fmt::Display,
{
    display_fn(move |f| {
        f.write_str("{")?;
        for (i, item) in items.clone().into_iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", item)?;
        }
        f.write_str("}")
    })
}
