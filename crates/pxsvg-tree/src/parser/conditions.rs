// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Conditional processing: `switch`, `requiredFeatures`,
//! `requiredExtensions` and `systemLanguage`.

use super::converter::{self, Context, Tables};
use super::svgtree::{AId, SvgNode};
use super::Options;
use crate::Group;

/// SVG 1.1 feature strings this crate implements.
static FEATURES: &[&str] = &[
    "http://www.w3.org/TR/SVG11/feature#SVGDOM-static",
    "http://www.w3.org/TR/SVG11/feature#SVG-static",
    "http://www.w3.org/TR/SVG11/feature#CoreAttribute",
    "http://www.w3.org/TR/SVG11/feature#Structure",
    "http://www.w3.org/TR/SVG11/feature#BasicStructure",
    "http://www.w3.org/TR/SVG11/feature#ConditionalProcessing",
    "http://www.w3.org/TR/SVG11/feature#Image",
    "http://www.w3.org/TR/SVG11/feature#Style",
    "http://www.w3.org/TR/SVG11/feature#ViewportAttribute",
    "http://www.w3.org/TR/SVG11/feature#Shape",
    "http://www.w3.org/TR/SVG11/feature#BasicText",
    "http://www.w3.org/TR/SVG11/feature#BasicPaintAttribute",
    "http://www.w3.org/TR/SVG11/feature#OpacityAttribute",
    "http://www.w3.org/TR/SVG11/feature#BasicGraphicsAttribute",
    "http://www.w3.org/TR/SVG11/feature#Gradient",
    "http://www.w3.org/TR/SVG11/feature#Pattern",
    "http://www.w3.org/TR/SVG11/feature#Clip",
    "http://www.w3.org/TR/SVG11/feature#BasicClip",
    "http://www.w3.org/TR/SVG11/feature#Mask",
    "http://www.w3.org/TR/SVG11/feature#XlinkAttribute",
];

/// Renders only the first direct child whose conditions pass.
pub(crate) fn convert_switch(node: SvgNode, ctx: &Context, tables: &mut Tables, out: &mut Group) {
    let child = match node.children().find(|n| passes(*n, ctx.opt)) {
        Some(child) => child,
        None => return,
    };

    let mut g = converter::new_group(node, ctx);
    converter::convert_element(child, ctx, tables, &mut g);
    if converter::resolve_effects(node, ctx, tables, &mut g) {
        converter::push_group(g, false, out);
    }
}

/// Evaluates the conditional attributes of an element.
pub(crate) fn passes(node: SvgNode, opt: &Options) -> bool {
    if !node.is_element() {
        return false;
    }

    // No extensions are supported.
    if node.has_attribute(AId::RequiredExtensions) {
        return false;
    }

    if let Some(features) = node.attribute::<&str>(AId::RequiredFeatures) {
        if !features.split_whitespace().all(|f| FEATURES.contains(&f)) {
            return false;
        }
    }

    match node.attribute::<&str>(AId::SystemLanguage) {
        Some(list) => list.split(',').any(|lang| matches_language(lang.trim(), &opt.languages)),
        None => true,
    }
}

/// Matches `en-US` against `en-US` and `en`.
fn matches_language(lang: &str, user: &[String]) -> bool {
    let prefix = lang.split('-').next().unwrap_or(lang);
    user.iter().any(|u| u == lang || (prefix != lang && u == prefix))
}
