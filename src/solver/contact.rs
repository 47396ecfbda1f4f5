//! Contact resolution: positional de-penetration followed by sequential
//! velocity impulses with restitution and Coulomb friction. The impulse
//! math dispatches on the body-type pair, since static, kinematic and
//! dynamic bodies expose different degrees of freedom.

use crate::collision::manifold::ContactManifold;
use crate::math::vec2::Vec2;
use crate::objects::body::{Body, BodyType};

const DENOMINATOR_EPSILON: f64 = 1e-12;
const TANGENT_EPSILON: f64 = 1e-12;

/// Combined material parameters for one contact. Restitution is the
/// minimum of both materials; friction follows the first material's
/// combine rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactProps {
    pub restitution: f64,
    pub static_friction: f64,
    pub dynamic_friction: f64,
}

/// How positional correction splits the separation between two movable
/// bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CorrectionWeighting {
    /// Each body moves in proportion to its own mass, so the heavier body
    /// is displaced further. This is the engine's historical behavior and
    /// the default.
    #[default]
    MassProportional,
    /// Each body moves in proportion to the other body's mass (the common
    /// convention: heavier bodies move less).
    InverseMass,
}

/// Moves the pair apart along `normal` (pointing from `a` to `b`) by the
/// full penetration depth. Static bodies never move.
pub fn correct_positions(
    a: &mut Body,
    b: &mut Body,
    normal: Vec2,
    depth: f64,
    weighting: CorrectionWeighting,
) {
    let separation = normal * depth;
    match (a.is_static(), b.is_static()) {
        (true, true) => {}
        (true, false) => b.set_position(b.position() + separation),
        (false, true) => a.set_position(a.position() - separation),
        (false, false) => {
            let total = a.mass() + b.mass();
            let ratio_a = if total > 0.0 {
                match weighting {
                    CorrectionWeighting::MassProportional => a.mass() / total,
                    CorrectionWeighting::InverseMass => b.mass() / total,
                }
            } else {
                0.5
            };
            a.set_position(a.position() - separation * ratio_a);
            b.set_position(b.position() + separation * (1.0 - ratio_a));
        }
    }
}

/// Applies the velocity constraint for one colliding pair. `normal`
/// points from `a` to `b`. Mass caches of both bodies must be fresh.
pub fn apply_impulses(
    a: &mut Body,
    b: &mut Body,
    normal: Vec2,
    manifold: &ContactManifold,
    props: &ContactProps,
) {
    match (a.body_type(), b.body_type()) {
        (BodyType::Static, BodyType::Static) => {}
        (BodyType::Dynamic, BodyType::Dynamic) => {
            dynamic_dynamic(a, b, normal, manifold, props);
        }
        (BodyType::Dynamic, _) | (_, BodyType::Dynamic) => {
            dynamic_mixed(a, b, normal, manifold, props);
        }
        _ => translational_pair(a, b, normal, props),
    }
}

/// Velocity of a point at offset `r` from the body center.
fn velocity_at(body: &Body, r: Vec2) -> Vec2 {
    let omega = body.angular_velocity();
    body.linear_velocity() + Vec2::new(-omega * r.y, omega * r.x)
}

/// Full rotational response on both sides, one impulse per contact point,
/// normal pass first and friction afterwards against the stored normal
/// impulses.
fn dynamic_dynamic(
    a: &mut Body,
    b: &mut Body,
    normal: Vec2,
    manifold: &ContactManifold,
    props: &ContactProps,
) {
    let mut normal_impulses = [0.0f64; 2];

    for (i, contact) in manifold.iter().enumerate() {
        let r_a = contact - a.position();
        let r_b = contact - b.position();
        let v_rel = velocity_at(b, r_b) - velocity_at(a, r_a);
        let vn = v_rel.dot(normal);
        if vn > 0.0 {
            continue;
        }

        let ra_cross_n = r_a.cross(normal);
        let rb_cross_n = r_b.cross(normal);
        let denom = a.inv_mass()
            + b.inv_mass()
            + ra_cross_n * ra_cross_n * a.inv_angular_mass()
            + rb_cross_n * rb_cross_n * b.inv_angular_mass();
        if denom < DENOMINATOR_EPSILON {
            continue;
        }

        let j = -(1.0 + props.restitution) * vn / denom;
        normal_impulses[i] = j;

        let impulse = normal * j;
        a.apply_impulse_at(r_a, -impulse);
        b.apply_impulse_at(r_b, impulse);
    }

    for (i, contact) in manifold.iter().enumerate() {
        let j = normal_impulses[i];
        let r_a = contact - a.position();
        let r_b = contact - b.position();
        let v_rel = velocity_at(b, r_b) - velocity_at(a, r_a);

        let tangential = v_rel - normal * v_rel.dot(normal);
        if tangential.magnitude_squared() < TANGENT_EPSILON {
            continue;
        }
        let tangent = tangential.normalize();

        let ra_cross_t = r_a.cross(tangent);
        let rb_cross_t = r_b.cross(tangent);
        let denom = a.inv_mass()
            + b.inv_mass()
            + ra_cross_t * ra_cross_t * a.inv_angular_mass()
            + rb_cross_t * rb_cross_t * b.inv_angular_mass();
        if denom < DENOMINATOR_EPSILON {
            continue;
        }

        let jt = -v_rel.dot(tangent) / denom;
        let impulse = if jt.abs() <= j * props.static_friction {
            tangent * jt
        } else {
            tangent * (-j * props.dynamic_friction)
        };

        a.apply_impulse_at(r_a, -impulse);
        b.apply_impulse_at(r_b, impulse);
    }
}

/// Exactly one side is dynamic; the other is kinematic or static. The
/// dynamic body takes the full impulse (its own effective mass only, split
/// across the contacts); a kinematic partner receives the opposite
/// translational impulse, a static partner nothing.
fn dynamic_mixed(
    a: &mut Body,
    b: &mut Body,
    normal: Vec2,
    manifold: &ContactManifold,
    props: &ContactProps,
) {
    let a_is_dynamic = a.body_type() == BodyType::Dynamic;
    let contact_count = manifold.count.max(1) as f64;
    let mut normal_impulses = [0.0f64; 2];

    for (i, contact) in manifold.iter().enumerate() {
        let (dynamic, other) = if a_is_dynamic { (&*a, &*b) } else { (&*b, &*a) };
        let r = contact - dynamic.position();
        // The partner contributes only its translational velocity.
        let v_dynamic = velocity_at(dynamic, r);
        let v_rel = if a_is_dynamic {
            other.linear_velocity() - v_dynamic
        } else {
            v_dynamic - other.linear_velocity()
        };
        let vn = v_rel.dot(normal);
        if vn > 0.0 {
            continue;
        }

        let r_cross_n = r.cross(normal);
        let denom = dynamic.inv_mass() + r_cross_n * r_cross_n * dynamic.inv_angular_mass();
        if denom < DENOMINATOR_EPSILON {
            continue;
        }

        let j = -(1.0 + props.restitution) * vn / denom / contact_count;
        normal_impulses[i] = j;
        apply_mixed_impulse(a, b, a_is_dynamic, r, normal * j);
    }

    for (i, contact) in manifold.iter().enumerate() {
        let j = normal_impulses[i];
        let (dynamic, other) = if a_is_dynamic { (&*a, &*b) } else { (&*b, &*a) };
        let r = contact - dynamic.position();
        let v_dynamic = velocity_at(dynamic, r);
        let v_rel = if a_is_dynamic {
            other.linear_velocity() - v_dynamic
        } else {
            v_dynamic - other.linear_velocity()
        };

        let tangential = v_rel - normal * v_rel.dot(normal);
        if tangential.magnitude_squared() < TANGENT_EPSILON {
            continue;
        }
        let tangent = tangential.normalize();

        let r_cross_t = r.cross(tangent);
        let denom = dynamic.inv_mass() + r_cross_t * r_cross_t * dynamic.inv_angular_mass();
        if denom < DENOMINATOR_EPSILON {
            continue;
        }

        let jt = -v_rel.dot(tangent) / denom;
        let impulse = if jt.abs() <= j * props.static_friction {
            tangent * jt
        } else {
            tangent * (-j * props.dynamic_friction)
        };
        apply_mixed_impulse(a, b, a_is_dynamic, r, impulse);
    }
}

/// Applies `impulse` (oriented first-to-second) for the mixed pair:
/// rotational response for the dynamic side, translational for the other.
fn apply_mixed_impulse(a: &mut Body, b: &mut Body, a_is_dynamic: bool, r: Vec2, impulse: Vec2) {
    if a_is_dynamic {
        a.apply_impulse_at(r, -impulse);
        b.apply_impulse(impulse);
    } else {
        a.apply_impulse(-impulse);
        b.apply_impulse_at(r, impulse);
    }
}

/// Kinematic-kinematic and kinematic-static pairs: purely translational,
/// a single implicit contact at the body centers.
fn translational_pair(a: &mut Body, b: &mut Body, normal: Vec2, props: &ContactProps) {
    let v_rel = b.linear_velocity() - a.linear_velocity();
    let vn = v_rel.dot(normal);
    if vn > 0.0 {
        return;
    }

    let denom = a.inv_mass() + b.inv_mass();
    if denom < DENOMINATOR_EPSILON {
        return;
    }

    let j = -(1.0 + props.restitution) * vn / denom;
    let impulse = normal * j;
    a.apply_impulse(-impulse);
    b.apply_impulse(impulse);

    let tangent = normal.perpendicular();
    let v_rel = b.linear_velocity() - a.linear_velocity();
    let vt = v_rel.dot(tangent);
    let jt = -vt / denom;
    let friction_impulse = if jt.abs() <= j * props.static_friction {
        tangent * jt
    } else {
        // Kinetic clamp, opposing the tangential relative motion.
        tangent * (-j * props.dynamic_friction * vt.signum())
    };
    a.apply_impulse(-friction_impulse);
    b.apply_impulse(friction_impulse);
}
