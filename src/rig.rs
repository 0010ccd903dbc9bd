use std::collections::BTreeMap;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
/// Skeleton joints the compositor cares about, independent of how a rig
/// names its bones.
pub enum JointRole {
    /// Root/pelvis joint; drives placement and camera follow.
    Root,
    /// Topmost head joint; drives establishing camera height.
    Head,
    /// Foot joint; reserved for ground checks.
    Foot,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
/// Joint roles resolved to concrete bone names, computed once at rig load.
pub struct JointMap {
    joints: BTreeMap<JointRole, String>,
}

impl JointMap {
    /// The bone resolved for `role`, if the rig has one.
    pub fn named_joint(&self, role: JointRole) -> Option<&str> {
        self.joints.get(&role).map(String::as_str)
    }
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
/// Name-alias table mapping joint roles to bone-name fragments.
///
/// Rigs from different sources disagree on naming ("Hips", "pelvis",
/// "mixamorig:Hips"); aliases are matched case-insensitively as substrings,
/// first alias wins. Resolution happens once per rig, never per frame.
pub struct JointAliases {
    aliases: BTreeMap<JointRole, Vec<String>>,
}

impl Default for JointAliases {
    fn default() -> Self {
        let mut aliases = BTreeMap::new();
        aliases.insert(
            JointRole::Root,
            vec!["hips".into(), "pelvis".into(), "hip".into()],
        );
        aliases.insert(
            JointRole::Head,
            vec!["headtop_end".into(), "head".into()],
        );
        aliases.insert(
            JointRole::Foot,
            vec!["foot".into(), "toebase".into(), "toe".into()],
        );
        Self { aliases }
    }
}

impl JointAliases {
    /// Override the alias list for one role.
    pub fn set(&mut self, role: JointRole, aliases: Vec<String>) {
        self.aliases.insert(role, aliases);
    }

    /// Resolve roles against a rig's bone names.
    pub fn resolve(&self, bone_names: &[String]) -> JointMap {
        let mut joints = BTreeMap::new();
        for (role, fragments) in &self.aliases {
            let hit = fragments.iter().find_map(|fragment| {
                bone_names
                    .iter()
                    .find(|name| name.to_lowercase().contains(fragment.as_str()))
            });
            if let Some(name) = hit {
                joints.insert(*role, name.clone());
            }
        }
        JointMap { joints }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn resolves_mixamo_names() {
        let bones = names(&[
            "mixamorig:Hips",
            "mixamorig:Spine",
            "mixamorig:HeadTop_End",
            "mixamorig:LeftFoot",
        ]);
        let map = JointAliases::default().resolve(&bones);
        assert_eq!(map.named_joint(JointRole::Root), Some("mixamorig:Hips"));
        assert_eq!(map.named_joint(JointRole::Head), Some("mixamorig:HeadTop_End"));
        assert_eq!(map.named_joint(JointRole::Foot), Some("mixamorig:LeftFoot"));
    }

    #[test]
    fn earlier_aliases_win() {
        let bones = names(&["Pelvis", "Hips"]);
        let map = JointAliases::default().resolve(&bones);
        // "hips" is listed before "pelvis".
        assert_eq!(map.named_joint(JointRole::Root), Some("Hips"));
    }

    #[test]
    fn unresolved_roles_are_absent() {
        let bones = names(&["Spine", "Neck"]);
        let map = JointAliases::default().resolve(&bones);
        assert_eq!(map.named_joint(JointRole::Root), None);
    }

    #[test]
    fn alias_overrides_take_effect() {
        let bones = names(&["Spine", "CenterOfMass"]);
        let mut aliases = JointAliases::default();
        aliases.set(JointRole::Root, vec!["centerofmass".into()]);
        let map = aliases.resolve(&bones);
        assert_eq!(map.named_joint(JointRole::Root), Some("CenterOfMass"));
    }
}
