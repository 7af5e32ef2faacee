mod entry;
mod food;
mod helpers;
mod remove;
mod show;

pub(crate) use entry::cmd_entry;
pub(crate) use food::cmd_food;
pub(crate) use remove::{cmd_remove_foods, cmd_remove_record};
pub(crate) use show::{cmd_show_foods, cmd_show_record};
