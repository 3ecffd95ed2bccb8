//! Configuration section definitions.
//!
//! Each module corresponds to a section in `caspar-graphics.toml`:
//!
//! | Module      | TOML Section    | Purpose                          |
//! |-------------|-----------------|----------------------------------|
//! | `project`   | `[project]`     | Project name                     |
//! | `templates` | `[templates]`   | Template root                    |
//! | `serve`     | `[serve]`       | Development server               |
//! | `build`     | `[build]`       | Production build command         |

mod build;
mod project;
mod serve;
mod templates;

pub use build::BuildConfig;
pub use project::ProjectConfig;
pub use serve::ServeConfig;
pub use templates::TemplatesConfig;
