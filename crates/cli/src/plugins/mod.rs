//! Plugins bundled with the command line front end.

mod activity_log;
mod auto_tag;
mod word_count;

use quire_plugin::PluginDef;

pub use activity_log::SIDEBAR_SLOT;
pub use word_count::ID as WORD_COUNT_ID;

/// Bundled plugins in registration order. Activation order comes from
/// their dependencies, not from this list.
pub fn bundled() -> Vec<PluginDef> {
	vec![auto_tag::plugin(), word_count::plugin(), activity_log::plugin()]
}
