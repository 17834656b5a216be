//! Accumulation of per-target contributions and blending into final Values.

use glam::{Quat, Vec3, Vec4};
use hashbrown::HashMap;

use crate::binding::{AnimationTarget, TargetHandle};
use crate::interp::functions::linear_value;
use crate::value::Value;

/// Weighted sums per value kind.
/// Quaternions are summed as 4-vectors after sign alignment with the first
/// contribution and normalized at blend time.
#[derive(Clone, Copy, Debug)]
enum AccumEntry {
    Scalar { sum: f32, w: f32 },
    Vec3 { sum: Vec3, w: f32 },
    Quat { sum: Vec4, first: Quat, w: f32 },
}

#[derive(Clone, Copy, Debug)]
struct Slot {
    entry: AccumEntry,
    /// The sole contribution, kept so single-source channels are written verbatim.
    single: Option<Value>,
}

impl AccumEntry {
    fn from_value(v: &Value, w: f32) -> Self {
        match v {
            Value::Float(x) => AccumEntry::Scalar { sum: x * w, w },
            Value::Vec3(x) => AccumEntry::Vec3 { sum: *x * w, w },
            Value::Quat(q) => AccumEntry::Quat {
                sum: Vec4::from(*q) * w,
                first: *q,
                w,
            },
        }
    }

    fn add_value(&mut self, v: &Value, w: f32) {
        match (self, v) {
            (AccumEntry::Scalar { sum, w: ww }, Value::Float(x)) => {
                *sum += x * w;
                *ww += w;
            }
            (AccumEntry::Vec3 { sum, w: ww }, Value::Vec3(x)) => {
                *sum += *x * w;
                *ww += w;
            }
            (AccumEntry::Quat { sum, first, w: ww }, Value::Quat(q)) => {
                let aligned = if first.dot(*q) < 0.0 { -*q } else { *q };
                *sum += Vec4::from(aligned) * w;
                *ww += w;
            }
            // Kind mismatch on one slot: ignore the late contribution (fail-soft).
            _ => {}
        }
    }

    fn weight(&self) -> f32 {
        match self {
            AccumEntry::Scalar { w, .. } | AccumEntry::Vec3 { w, .. } | AccumEntry::Quat { w, .. } => {
                *w
            }
        }
    }

    fn average(&self) -> Value {
        match self {
            AccumEntry::Scalar { sum, w } => Value::Float(sum / w),
            AccumEntry::Vec3 { sum, w } => Value::Vec3(*sum / *w),
            AccumEntry::Quat { sum, first, .. } => {
                let len2 = sum.length_squared();
                if len2 > 0.0 {
                    Value::Quat(Quat::from_vec4(*sum / len2.sqrt()))
                } else {
                    Value::Quat(*first)
                }
            }
        }
    }
}

/// Collects weighted samples for one mixer tick, then writes blended values out.
#[derive(Debug, Default)]
pub struct Accumulator {
    slots: HashMap<TargetHandle, Slot>,
    /// Insertion order, so writes happen deterministically.
    order: Vec<TargetHandle>,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.order.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn add(&mut self, handle: TargetHandle, value: &Value, weight: f32) {
        if weight <= 0.0 {
            return;
        }
        match self.slots.get_mut(&handle) {
            Some(slot) => {
                slot.entry.add_value(value, weight);
                slot.single = None;
            }
            None => {
                self.slots.insert(
                    handle,
                    Slot {
                        entry: AccumEntry::from_value(value, weight),
                        single: (weight == 1.0).then_some(*value),
                    },
                );
                self.order.push(handle);
            }
        }
    }

    /// Blended value for a handle. When the total weight is below 1 the remainder
    /// comes from `original` (the value already bound on the target).
    pub fn blended(&self, handle: TargetHandle, original: Option<Value>) -> Option<Value> {
        let slot = self.slots.get(&handle)?;
        if let Some(v) = slot.single {
            return Some(v);
        }
        let w = slot.entry.weight();
        let avg = slot.entry.average();
        match original {
            Some(orig) if w < 1.0 => Some(linear_value(&orig, &avg, w)),
            _ => Some(avg),
        }
    }

    pub fn apply<T: AnimationTarget + ?Sized>(&self, target: &mut T) {
        for handle in &self.order {
            let original = target.read(*handle);
            if let Some(v) = self.blended(*handle, original) {
                target.write(*handle, v);
            }
        }
    }
}
