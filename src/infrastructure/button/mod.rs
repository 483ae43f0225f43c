//! Button adapters

mod keyboard;
mod sysfs;

pub use keyboard::KeyboardButton;
pub use sysfs::{SysfsButton, GPIO_SYSFS_ROOT};
