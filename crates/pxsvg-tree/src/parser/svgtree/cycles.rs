// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use std::collections::HashMap;
use std::str::FromStr;

use simplecss::StyleSheet;

use super::parse::{cascaded_value, resolve_href, svg_tag, Links};
use super::EId;
use crate::Error;

/// Rejects documents where instantiating an element would end up
/// instantiating the element itself.
///
/// An element depends on whatever it and its descendants point to through
/// `href` on `use`, gradients and patterns, and through `clip-path` and
/// `mask`. Paint references are allowed to loop and are left to the renderer.
pub(super) fn check<'x, 'a>(
    xml: &'x roxmltree::Document<'a>,
    links: &Links<'x, 'a>,
    css: &StyleSheet,
) -> Result<(), Error> {
    // `false` while a node is on the stack, `true` once all its
    // dependencies are known to be acyclic.
    let mut finished: HashMap<roxmltree::NodeId, bool> = HashMap::new();

    let targets = xml
        .descendants()
        .filter(|n| n.attribute("id").and_then(|id| links.get(id)) == Some(n));
    for target in targets {
        if finished.contains_key(&target.id()) {
            continue;
        }

        finished.insert(target.id(), false);
        let mut stack = vec![(target, dependencies(target, links, css).into_iter())];
        while let Some((node, deps)) = stack.last_mut() {
            let node = *node;
            let dep = match deps.next() {
                Some(dep) => dep,
                None => {
                    finished.insert(node.id(), true);
                    stack.pop();
                    continue;
                }
            };

            match finished.get(&dep.id()) {
                Some(true) => {}
                Some(false) => {
                    let id = dep.attribute("id").unwrap_or_default();
                    return Err(Error::CyclicReference(id.to_string()));
                }
                None => {
                    finished.insert(dep.id(), false);
                    stack.push((dep, dependencies(dep, links, css).into_iter()));
                }
            }
        }
    }

    Ok(())
}

fn dependencies<'x, 'a>(
    root: roxmltree::Node<'x, 'a>,
    links: &Links<'x, 'a>,
    css: &StyleSheet,
) -> Vec<roxmltree::Node<'x, 'a>> {
    let mut deps = Vec::new();
    for node in root.descendants() {
        let tag = match svg_tag(node) {
            Some(tag) => tag,
            None => continue,
        };

        if tag == EId::Use || tag == EId::Pattern || tag.is_gradient() {
            deps.extend(resolve_href(node, links));
        }

        for name in ["clip-path", "mask"] {
            let target = cascaded_value(node, name, css).and_then(|value| {
                let id = svgtypes::FuncIRI::from_str(&value).ok()?.0;
                links.get(id).copied()
            });
            deps.extend(target);
        }
    }

    deps
}

#[cfg(test)]
mod tests {
    use super::super::Document;
    use crate::Error;

    fn check(text: &str) -> Result<(), Error> {
        let xml = roxmltree::Document::parse(text).unwrap();
        Document::parse(&xml, None).map(|_| ())
    }

    #[test]
    fn mask_through_css() {
        let result = check(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <style>#m rect { mask: url(#m) }</style>
                <mask id='m'><rect/></mask>
            </svg>",
        );
        assert!(matches!(result, Err(Error::CyclicReference(ref id)) if id == "m"));
    }

    #[test]
    fn gradient_templates_loop() {
        let result = check(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <linearGradient id='a' href='#b'/>
                <radialGradient id='b' href='#a'/>
            </svg>",
        );
        assert!(matches!(result, Err(Error::CyclicReference(_))));
    }

    #[test]
    fn shared_dependency_is_not_a_loop() {
        let result = check(
            "<svg xmlns='http://www.w3.org/2000/svg'>
                <clipPath id='c'><rect/></clipPath>
                <g id='g1' clip-path='url(#c)'/>
                <use href='#g1'/>
                <use href='#g1'/>
                <rect fill='url(#p)'/>
                <pattern id='p'><rect fill='url(#p)'/></pattern>
            </svg>",
        );
        assert!(result.is_ok());
    }
}
