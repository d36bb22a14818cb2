//! Built-in rule sets.

pub(crate) mod standard {
    pub(crate) mod rules;

    #[cfg(test)]
    mod tests;
}
