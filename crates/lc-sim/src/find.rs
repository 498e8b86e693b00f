//! Declarative object query engine: a small tree of criteria opcodes
//! evaluated against the section's object table, with sector-index
//! shortcuts for the rect-bounded cases and a stable multi-key sort.
//! Grounded on spec §4.L; the `Criterion` enum plus boxed recursion
//! mirrors the teacher's `cmodel.rs` plane/brush tree walk style (tagged
//! enum with boxed children rather than a virtual-dispatch class
//! hierarchy).
use crate::context::Section;
use crate::object::{Object, ObjectId, Ocf};

#[derive(Debug, Clone)]
pub enum Criterion {
    Not(Box<Criterion>),
    And(Vec<Criterion>),
    Or(Vec<Criterion>),
    Exclude(ObjectId),
    Id(ObjectId),
    InRect(i32, i32, i32, i32),
    AtPoint(i32, i32),
    AtRect(i32, i32, i32, i32),
    OnLine(i32, i32, i32, i32),
    Distance { x: i32, y: i32, max: i32 },
    Ocf(Ocf),
    Category(Ocf),
    Owner(i32),
    Controller(i32),
    Container(Option<ObjectId>),
    AnyContainer,
    Layer(Option<ObjectId>),
    /// Caller-supplied predicate, kept opaque so this crate never depends
    /// on the script engine for the `Func` opcode.
    Func(fn(&Object) -> bool),
}

#[derive(Debug, Clone, Copy)]
pub enum SortKey {
    Distance { x: i32, y: i32 },
    Speed,
    Mass(fn(&Object) -> i32),
    Value(fn(&Object) -> i32),
    Reverse,
}

/// Bounding rect a criterion can use to pre-filter via the sector index,
/// when one applies. `And` intersects child rects; `Or` unions them.
fn bounding_rect(criterion: &Criterion) -> Option<(i32, i32, i32, i32)> {
    match criterion {
        Criterion::InRect(x0, y0, x1, y1) | Criterion::AtRect(x0, y0, x1, y1) => Some((*x0, *y0, *x1, *y1)),
        Criterion::And(children) => children.iter().filter_map(bounding_rect).fold(None, |acc, r| match acc {
            None => Some(r),
            Some((ax0, ay0, ax1, ay1)) => Some((ax0.max(r.0), ay0.max(r.1), ax1.min(r.2), ay1.min(r.3))),
        }),
        Criterion::Or(children) => {
            let rects: Option<Vec<_>> = children.iter().map(bounding_rect).collect();
            rects.map(|rs| {
                rs.into_iter().reduce(|(ax0, ay0, ax1, ay1), (bx0, by0, bx1, by1)| {
                    (ax0.min(bx0), ay0.min(by0), ax1.max(bx1), ay1.max(by1))
                }).unwrap()
            })
        }
        _ => None,
    }
}

fn matches(criterion: &Criterion, obj: &Object) -> bool {
    match criterion {
        Criterion::Not(inner) => !matches(inner, obj),
        Criterion::And(children) => children.iter().all(|c| matches(c, obj)),
        Criterion::Or(children) => children.iter().any(|c| matches(c, obj)),
        Criterion::Exclude(id) => obj.id != *id,
        Criterion::Id(id) => obj.id == *id,
        Criterion::InRect(x0, y0, x1, y1) => {
            let (cx, cy) = (obj.cx(), obj.cy());
            cx >= *x0 && cx < *x1 && cy >= *y0 && cy < *y1
        }
        Criterion::AtPoint(px, py) => {
            let (x0, y0, x1, y1) = obj.bounding_rect();
            *px >= x0 && *px < x1 && *py >= y0 && *py < y1
        }
        Criterion::AtRect(x0, y0, x1, y1) => {
            let (ox0, oy0, ox1, oy1) = obj.bounding_rect();
            ox0 < *x1 && ox1 > *x0 && oy0 < *y1 && oy1 > *y0
        }
        Criterion::OnLine(lx0, ly0, lx1, ly1) => {
            let (cx, cy) = (obj.cx(), obj.cy());
            point_near_line(cx, cy, *lx0, *ly0, *lx1, *ly1)
        }
        Criterion::Distance { x, y, max } => lc_math::distance(*x, *y, obj.cx(), obj.cy()) <= *max,
        Criterion::Ocf(flags) => obj.category.intersects(*flags),
        Criterion::Category(flags) => obj.category.contains(*flags),
        Criterion::Owner(owner) => obj.owner == *owner,
        Criterion::Controller(controller) => obj.controller == *controller,
        Criterion::Container(target) => obj.container == *target,
        Criterion::AnyContainer => obj.container.is_some(),
        Criterion::Layer(target) => obj.layer == *target,
        Criterion::Func(f) => f(obj),
    }
}

fn point_near_line(px: i32, py: i32, x0: i32, y0: i32, x1: i32, y1: i32) -> bool {
    let (dx, dy) = (x1 - x0, y1 - y0);
    let len_sq = dx * dx + dy * dy;
    if len_sq == 0 {
        return px == x0 && py == y0;
    }
    let t = (((px - x0) * dx + (py - y0) * dy) as f64 / len_sq as f64).clamp(0.0, 1.0);
    let (nx, ny) = (x0 as f64 + t * dx as f64, y0 as f64 + t * dy as f64);
    let dist_sq = (px as f64 - nx).powi(2) + (py as f64 - ny).powi(2);
    dist_sq <= 1.0
}

/// Runs `criterion` against the section, using the sector index when a
/// bounding rect can be derived and falling back to a full table scan for
/// `AtPoint` (which needs exact shape containment, not just the sector
/// grid) and anything without a derivable rect.
pub fn find_many(section: &Section, criterion: &Criterion) -> Vec<ObjectId> {
    let candidates: Vec<ObjectId> = match bounding_rect(criterion) {
        Some((x0, y0, x1, y1)) if !matches!(criterion, Criterion::AtPoint(_, _)) => {
            section.sectors.objects_by_shape_in(x0, y0, x1, y1)
        }
        _ => section.objects.iter().map(|o| o.id).collect(),
    };
    let mut found: Vec<ObjectId> = candidates
        .into_iter()
        .filter(|id| section.object(*id).map_or(false, |o| matches(criterion, o)))
        .collect();
    found.sort_unstable();
    found
}

pub fn count(section: &Section, criterion: &Criterion) -> usize {
    find_many(section, criterion).len()
}

pub fn find_first(section: &Section, criterion: &Criterion) -> Option<ObjectId> {
    find_many(section, criterion).into_iter().next()
}

/// Sorts `ids` in place by the given key sequence, stable across equal
/// keys so repeated queries stay deterministic. `Reverse` flips the sense
/// of every key that follows it.
pub fn sort_by(section: &Section, ids: &mut [ObjectId], keys: &[SortKey]) {
    let mut reversed = false;
    let mut effective_keys: Vec<(SortKey, bool)> = Vec::new();
    for key in keys {
        match key {
            SortKey::Reverse => reversed = !reversed,
            other => effective_keys.push((*other, reversed)),
        }
    }
    ids.sort_by(|a, b| {
        let (oa, ob) = match (section.object(*a), section.object(*b)) {
            (Some(oa), Some(ob)) => (oa, ob),
            _ => return std::cmp::Ordering::Equal,
        };
        for (key, rev) in &effective_keys {
            let ord = match key {
                SortKey::Distance { x, y } => {
                    lc_math::distance(*x, *y, oa.cx(), oa.cy()).cmp(&lc_math::distance(*x, *y, ob.cx(), ob.cy()))
                }
                SortKey::Speed => {
                    let sa = lc_math::distance(0, 0, oa.xdir.round_to_int(), oa.ydir.round_to_int());
                    let sb = lc_math::distance(0, 0, ob.xdir.round_to_int(), ob.ydir.round_to_int());
                    sa.cmp(&sb)
                }
                SortKey::Mass(f) | SortKey::Value(f) => f(oa).cmp(&f(ob)),
                SortKey::Reverse => unreachable!("filtered out above"),
            };
            let ord = if *rev { ord.reverse() } else { ord };
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use lc_landscape::{Material, MaterialTable};
    use lc_math::Fixed;
    use lc_shape::Shape;

    fn section_with_objects() -> (Section, Vec<ObjectId>) {
        let mut materials = MaterialTable::new();
        materials.add(Material::new("Sky", 0, 0, 0));
        let mut sec = Section::new(materials, 1000, 1000, 1);
        let mut ids = Vec::new();
        for i in 0..8 {
            let x = (i % 4) * 100;
            let mut obj = Object::new(0, Fixed::from_int(x), Fixed::from_int(50), Shape::new());
            if i < 2 {
                obj.category = Ocf::ALIVE;
            }
            ids.push(sec.spawn(obj));
        }
        (sec, ids)
    }

    #[test]
    fn count_and_category_filter_match_s4() {
        let (sec, _ids) = section_with_objects();
        let criterion = Criterion::And(vec![Criterion::InRect(0, 0, 250, 100), Criterion::Category(Ocf::ALIVE)]);
        assert_eq!(count(&sec, &criterion), 2);
    }

    #[test]
    fn find_many_returns_sorted_by_id() {
        let (sec, ids) = section_with_objects();
        let all = find_many(&sec, &Criterion::InRect(0, 0, 1000, 1000));
        assert_eq!(all.len(), ids.len());
        let mut sorted = all.clone();
        sorted.sort_unstable();
        assert_eq!(all, sorted);
    }

    #[test]
    fn sort_by_distance_orders_nearest_first() {
        let (sec, ids) = section_with_objects();
        let mut subset = ids.clone();
        sort_by(&sec, &mut subset, &[SortKey::Distance { x: 0, y: 50 }]);
        let first = sec.object(subset[0]).unwrap();
        assert_eq!(first.cx(), 0);
    }

    #[test]
    fn reverse_flips_sort_order() {
        let (sec, ids) = section_with_objects();
        let mut ascending = ids.clone();
        sort_by(&sec, &mut ascending, &[SortKey::Distance { x: 0, y: 50 }]);
        let mut descending = ids.clone();
        sort_by(&sec, &mut descending, &[SortKey::Distance { x: 0, y: 50 }, SortKey::Reverse]);
        assert_eq!(ascending.first(), descending.last());
    }
}
