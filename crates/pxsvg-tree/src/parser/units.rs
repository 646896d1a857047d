// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Length resolution.

use svgtypes::{Length, LengthUnit};

use super::converter::Context;
use super::svgtree::{AId, SvgNode};
use crate::Units;

/// The viewport dimension a percentage refers to.
#[derive(Clone, Copy, PartialEq, Debug)]
pub(crate) enum Axis {
    Horizontal,
    Vertical,
    /// The viewport diagonal divided by `sqrt(2)`.
    Diagonal,
}

impl Axis {
    pub fn of(aid: AId) -> Self {
        match aid {
            AId::Cx | AId::Dx | AId::Fx | AId::Rx | AId::Width | AId::X | AId::X1 | AId::X2 => {
                Axis::Horizontal
            }
            AId::Cy | AId::Dy | AId::Fy | AId::Ry | AId::Height | AId::Y | AId::Y1 | AId::Y2 => {
                Axis::Vertical
            }
            _ => Axis::Diagonal,
        }
    }
}

/// User units per unit for lengths that do not depend on the context.
fn absolute_scale(unit: LengthUnit, dpi: f32) -> Option<f32> {
    let scale = match unit {
        LengthUnit::None | LengthUnit::Px => 1.0,
        LengthUnit::In => dpi,
        LengthUnit::Cm => dpi / 2.54,
        LengthUnit::Mm => dpi / 25.4,
        LengthUnit::Pt => dpi / 72.0,
        LengthUnit::Pc => dpi / 6.0,
        LengthUnit::Em | LengthUnit::Ex | LengthUnit::Percent => return None,
    };

    Some(scale)
}

impl Context<'_> {
    /// Converts a length into user units.
    ///
    /// With `ObjectBoundingBox` units a percentage is a plain fraction.
    pub fn convert(&self, length: Length, node: SvgNode, axis: Axis, units: Units) -> f32 {
        let n = length.number as f32;
        if let Some(scale) = absolute_scale(length.unit, self.opt.dpi) {
            return n * scale;
        }

        match length.unit {
            LengthUnit::Em => n * self.font_size(node),
            LengthUnit::Ex => n * self.font_size(node) / 2.0,
            _ if units == Units::ObjectBoundingBox => n / 100.0,
            _ => {
                let vb = self.view_box;
                let base = match axis {
                    Axis::Horizontal => vb.width(),
                    Axis::Vertical => vb.height(),
                    Axis::Diagonal => (vb.width().powi(2) + vb.height().powi(2)).sqrt() / 2f32.sqrt(),
                };
                n * base / 100.0
            }
        }
    }

    /// Converts an attribute, using `def` when it is missing or invalid.
    pub fn length(&self, node: SvgNode, aid: AId, units: Units, def: Length) -> f32 {
        let length = node.attribute(aid).unwrap_or(def);
        self.convert(length, node, Axis::of(aid), units)
    }

    pub fn user_length(&self, node: SvgNode, aid: AId, def: Length) -> f32 {
        self.length(node, aid, Units::UserSpaceOnUse, def)
    }

    pub fn try_length(&self, node: SvgNode, aid: AId, units: Units) -> Option<f32> {
        let length = node.attribute(aid)?;
        Some(self.convert(length, node, Axis::of(aid), units))
    }

    /// Resolves an inherited length property, like `stroke-width`.
    ///
    /// Relative units use the element that declares the value.
    pub fn inherited_length(&self, node: SvgNode, aid: AId, def: f32) -> f32 {
        match node.find_node_with(aid) {
            Some(n) => self
                .try_length(n, aid, Units::UserSpaceOnUse)
                .unwrap_or(def),
            None => def,
        }
    }

    /// Converts a whitespace or comma separated list of lengths.
    pub fn length_list(&self, node: SvgNode, aid: AId) -> Option<Vec<f32>> {
        let list: Vec<Length> = node.attribute(aid)?;
        let axis = Axis::of(aid);
        Some(
            list.into_iter()
                .map(|length| self.convert(length, node, axis, Units::UserSpaceOnUse))
                .collect(),
        )
    }

    /// The computed `font-size` of an element.
    pub fn font_size(&self, node: SvgNode) -> f32 {
        let mut sizes: Vec<&str> = node
            .ancestors()
            .filter_map(|n| n.try_attribute::<&str>(AId::FontSize))
            .collect();
        sizes.reverse();

        sizes
            .into_iter()
            .fold(self.opt.font_size, |parent, value| self.font_size_from(value, parent))
    }

    fn font_size_from(&self, value: &str, parent: f32) -> f32 {
        if let Ok(length) = value.parse::<Length>() {
            let n = length.number as f32;
            return match length.unit {
                LengthUnit::Em => n * parent,
                LengthUnit::Ex => n * parent / 2.0,
                LengthUnit::Percent => n * parent / 100.0,
                unit => n * absolute_scale(unit, self.opt.dpi).unwrap_or(1.0),
            };
        }

        // Adjacent keywords differ by a factor of 1.2.
        let step = match value {
            "xx-small" => -3,
            "x-small" => -2,
            "small" | "smaller" => -1,
            "medium" => 0,
            "large" | "larger" => 1,
            "x-large" => 2,
            "xx-large" => 3,
            _ => {
                log::warn!("Invalid {} value: '{}'.", AId::FontSize, value);
                0
            }
        };

        parent * 1.2f32.powi(step)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn physical_units() {
        assert_eq!(absolute_scale(LengthUnit::In, 96.0), Some(96.0));
        assert_eq!(absolute_scale(LengthUnit::Pt, 72.0), Some(1.0));
        assert_eq!(absolute_scale(LengthUnit::Percent, 96.0), None);
    }

    #[test]
    fn axis_by_attribute() {
        assert_eq!(Axis::of(AId::Rx), Axis::Horizontal);
        assert_eq!(Axis::of(AId::Y2), Axis::Vertical);
        assert_eq!(Axis::of(AId::R), Axis::Diagonal);
        assert_eq!(Axis::of(AId::StrokeWidth), Axis::Diagonal);
    }
}
