//! Native entry point: CLI parsing, logging setup and the eframe bootstrap.

mod run;

/// Process entry point; builds the tokio runtime the dataset loader runs on.
pub fn main() {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();

    rt.block_on(run::native_main());
}
