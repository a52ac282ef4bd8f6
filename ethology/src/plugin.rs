//! Dynamic node-library loading. A plugin crate built as a `cdylib` exports
//! a single `extern "C" fn register_nodes(factory: &mut Factory)`; loading
//! resolves that symbol, calls it, and reports which node ids appeared that
//! weren't there before.

use libloading::{Library, Symbol};
use log::{info, warn};

use crate::{
    error::{BehaviorTreeError, RuntimeError},
    xml_loader::Factory,
};

pub type RegisterNodesFn = unsafe extern "C" fn(&mut Factory);

/// A loaded plugin library and the ids it registered. Keeping the `Library`
/// alive for as long as any node it registered might still be ticked is the
/// caller's responsibility; dropping it unloads the dylib's code.
pub struct LoadedPlugin {
    pub path: String,
    pub registered_ids: Vec<String>,
    _library: Library,
}

/// Loads the dylib at `path`, calls its `register_nodes` entry point, and
/// returns the set of node ids it added. A plugin that tries to register an
/// id the factory already knows is rejected by `Factory::register_node`
/// itself, not here.
pub fn load_plugin(factory: &mut Factory, path: &str) -> Result<LoadedPlugin, BehaviorTreeError> {
    let before = factory.registered_ids();

    // Safety: the symbol is resolved by name and invoked with the ABI this
    // crate documents (`extern "C" fn(&mut Factory)`); the caller is
    // trusted to point `path` at a plugin built against a compatible
    // `ethology` version.
    let library = unsafe { Library::new(path) }.map_err(|e| RuntimeError::PluginLoadFailure(e.to_string()))?;

    unsafe {
        let register: Symbol<RegisterNodesFn> = library
            .get(b"register_nodes\0")
            .map_err(|e| RuntimeError::PluginLoadFailure(e.to_string()))?;

        register(factory);
    }

    let after = factory.registered_ids();
    let mut registered_ids: Vec<String> = after.difference(&before).cloned().collect();
    registered_ids.sort();

    if registered_ids.is_empty() {
        warn!("plugin [{path}] registered no new node ids");
    }

    for id in &registered_ids {
        info!("plugin [{path}] registered node [{id}]");
    }

    Ok(LoadedPlugin {
        path: path.to_string(),
        registered_ids,
        _library: library,
    })
}
