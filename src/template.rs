use crate::context::ParseContext;
use crate::element::Element;
use crate::{LoadError, Object};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::BufReader;
use std::rc::Rc;

/// Templates loaded while parsing one document, keyed by the path as written.
#[derive(Default)]
pub(crate) struct TemplateCache {
    loaded: HashMap<String, Rc<Object>>,
    loading: HashSet<String>,
    default_pattern: Rc<Object>,
}

impl TemplateCache {
    /// Number of distinct template paths looked up so far.
    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.loaded.len()
    }
}

/// Find the pattern object for a template path, loading it on first use.
///
/// No template, or one that can't be read, gives the default pattern. A failed path is
/// remembered so it's only tried once per document.
///
/// # Errors
/// Errors if the template's object holds a malformed value.
pub(crate) fn resolve(ctx: &mut ParseContext, path: Option<&str>) -> Result<Rc<Object>, LoadError> {
    let default = Rc::clone(&ctx.templates.default_pattern);
    let Some(path) = path.filter(|path| !path.is_empty()) else {
        return Ok(default);
    };
    if let Some(pattern) = ctx.templates.loaded.get(path) {
        return Ok(Rc::clone(pattern));
    }
    if !ctx.templates.loading.insert(path.to_owned()) {
        warn!("template {path:?} refers back to itself, using the default pattern");
        return Ok(default);
    }

    let loaded = open(ctx, path).map(|object| Object::parse(&object, ctx));
    ctx.templates.loading.remove(path);
    let pattern = match loaded {
        Ok(object) => {
            let object = object?;
            debug!("loaded template {path:?}");
            Rc::new(object)
        }
        Err(err) => {
            warn!("{err}, using the default pattern");
            default
        }
    };
    ctx.templates
        .loaded
        .insert(path.to_owned(), Rc::clone(&pattern));
    Ok(pattern)
}

/// Read a template file and return its object element.
fn open(ctx: &ParseContext, path: &str) -> Result<Element, LoadError> {
    let failed = |source: LoadError| LoadError::TemplateLoadFailed {
        path: path.to_owned(),
        source: Box::new(source),
    };
    let file = File::open(ctx.base_dir().join(path)).map_err(|err| failed(err.into()))?;
    let root = Element::read(BufReader::new(file)).map_err(failed)?;
    Some(&root)
        .filter(|root| root.name() == "template")
        .and_then(|root| root.child("object"))
        .cloned()
        .ok_or_else(|| {
            failed(LoadError::DocumentMalformed(
                "expected <template> holding an <object>".into(),
            ))
        })
}
