//! Configuration section definitions.
//!
//! Each module corresponds to a section in `swdev.toml`:
//!
//! | Module       | TOML Section     | Purpose                                 |
//! |--------------|------------------|-----------------------------------------|
//! | `page`       | `[page]`         | Origin relative paths resolve against   |
//! | `worker`     | `[worker]`       | Worker script path and update polling   |
//! | `channel`    | `[channel]`      | Command channel endpoint, loss policy   |
//! | `revalidate` | `[revalidate]`   | Revalidation endpoint and timeout       |
//! | `module`     | `[module]`       | Module loader selection                 |

mod channel;
mod module;
mod page;
mod revalidate;
mod worker;

pub use channel::ChannelConfig;
pub use module::{LoaderKind, ModuleConfig};
pub use page::PageConfig;
pub use revalidate::RevalidateConfig;
pub use worker::WorkerConfig;
