mod custom_archetype;
mod points3d;
