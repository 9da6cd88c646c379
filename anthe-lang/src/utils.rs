pub mod error;
pub mod metadata;

#[macro_export]
macro_rules! format_vec {
    ($vec:expr,$sep:expr) => {
        $vec.iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join($sep)
    };
}
