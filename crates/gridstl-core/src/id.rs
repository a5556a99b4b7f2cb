//! Identifiers: queue and program counters, and kernel names.

use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

macro_rules! new_id {
    ($name:ident) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Ord, PartialOrd,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(v: u64) -> Self {
                Self(v)
            }
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

new_id!(QueueId);
new_id!(ProgramId);

/// Identity of one device program.
///
/// A kernel is identified by the family chosen by the execution policy, the
/// stage of the algorithm that launches it, and a tag naming the kernel body.
/// Two launches with equal names reuse the same compiled program.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KernelName {
    family: Cow<'static, str>,
    stage: u32,
    tag: Cow<'static, str>,
}

impl KernelName {
    pub fn new(
        family: impl Into<Cow<'static, str>>,
        stage: u32,
        tag: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            family: family.into(),
            stage,
            tag: tag.into(),
        }
    }

    pub fn family(&self) -> &str {
        &self.family
    }

    pub fn stage(&self) -> u32 {
        self.stage
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl fmt::Display for KernelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<{}, {}>", self.family, self.stage, self.tag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kernel_names_differ_by_stage_and_tag() {
        let a = KernelName::new("sum", 0, "map");
        let b = KernelName::new("sum", 1, "map");
        let c = KernelName::new("sum", 0, "reduce");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, KernelName::new(String::from("sum"), 0, "map"));
        assert_eq!(a.to_string(), "sum<0, map>");
    }

    #[test]
    fn ids_display_with_type_name() {
        assert_eq!(QueueId::new(3).to_string(), "QueueId(3)");
        assert_eq!(ProgramId::new(7).get(), 7);
    }
}
