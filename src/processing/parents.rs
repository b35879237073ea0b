use std::collections::HashMap;

use crate::domain::{Child, LinkedChildInfo, Parent, Program};

/// Build the parent directory from both child collections.
///
/// Parents are keyed by email. Children without an email are skipped, a child
/// is linked once, and the last child seen supplies the parent's name and
/// phone. Preschool children are visited before afterschool children.
pub fn aggregate_parents(preschool: &[Child], afterschool: &[Child]) -> Vec<Parent> {
    let mut parents: Vec<Parent> = Vec::new();
    let mut by_email: HashMap<String, usize> = HashMap::new();

    let tagged = preschool
        .iter()
        .map(|c| (c, Program::Preschool))
        .chain(afterschool.iter().map(|c| (c, Program::Afterschool)));

    for (child, program) in tagged {
        let email = &child.profile.parent_email;
        if email.is_empty() {
            continue;
        }

        let link = LinkedChildInfo {
            id: child.id.clone(),
            name: child.profile.name.clone(),
            program,
        };

        match by_email.get(email) {
            Some(&index) => {
                let parent = &mut parents[index];
                if !parent.children.iter().any(|c| c.id == child.id) {
                    parent.children.push(link);
                }
                parent.name = child.profile.parent.clone();
                parent.phone = child.profile.parent_phone.clone();
            }
            None => {
                by_email.insert(email.clone(), parents.len());
                parents.push(Parent {
                    email: email.clone(),
                    name: child.profile.parent.clone(),
                    phone: child.profile.parent_phone.clone(),
                    children: vec![link],
                });
            }
        }
    }

    parents.sort_by_cached_key(|p| p.name.to_lowercase());
    parents
}
