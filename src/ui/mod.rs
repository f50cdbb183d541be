pub mod headless;
pub mod layout;
pub mod outline;
pub mod renderer;
pub mod terminal;

pub use headless::run_headless;
pub use terminal::run_ui;
