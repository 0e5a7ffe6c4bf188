use std::collections::BTreeMap;

use crate::cube::face_layout::FaceLayout;
use crate::shared::constants::{CENTER_INDEX, STICKERS_PER_FACE};
use crate::shared::cube::{ColorCode, Face};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum OrientationError {
    #[error("Face {0} is missing or incomplete")]
    IncompleteFace(Face),
    #[error("Center sticker of face {face} is unknown ({color})")]
    UnknownCenter { face: Face, color: ColorCode },
    #[error("Center colors are not unique; cube orientation cannot be inferred")]
    AmbiguousCenters,
    #[error("Color {0} has no matching center face")]
    UnmappedColor(ColorCode),
}

/// Maps each center color to the face it sits on.
///
/// Requires all six centers to be known and pairwise distinct.
pub fn orientation_mapping(layout: &FaceLayout) -> Result<BTreeMap<ColorCode, Face>, OrientationError> {
    check_structure(layout)?;

    let mut centers = Vec::with_capacity(Face::ORDER.len());
    for face in Face::ORDER {
        let center = layout
            .face(face)
            .and_then(|stickers| stickers.get(CENTER_INDEX).copied())
            .ok_or(OrientationError::IncompleteFace(face))?;
        if !center.is_known() {
            return Err(OrientationError::UnknownCenter { face, color: center });
        }
        centers.push((center, face));
    }

    // Uniqueness is only checked once every center is known.
    let mut mapping = BTreeMap::new();
    for (center, face) in centers {
        if mapping.insert(center, face).is_some() {
            return Err(OrientationError::AmbiguousCenters);
        }
    }
    Ok(mapping)
}

/// Builds the 54-letter facelet string in `U R F D L B` order.
///
/// Each sticker is written as the letter of the face whose center shares
/// its color, so the result is independent of the cube's physical color
/// scheme.
pub fn resolve(layout: &FaceLayout) -> Result<String, OrientationError> {
    let mapping = orientation_mapping(layout)?;

    let mut facelets = String::with_capacity(Face::ORDER.len() * STICKERS_PER_FACE);
    for face in Face::ORDER {
        let stickers = layout.face(face).ok_or(OrientationError::IncompleteFace(face))?;
        for color in stickers {
            let mapped = mapping.get(color).ok_or(OrientationError::UnmappedColor(*color))?;
            facelets.push(mapped.letter());
        }
    }
    Ok(facelets)
}

fn check_structure(layout: &FaceLayout) -> Result<(), OrientationError> {
    for face in Face::ORDER {
        match layout.face(face) {
            Some(stickers) if stickers.len() == STICKERS_PER_FACE => {}
            _ => return Err(OrientationError::IncompleteFace(face)),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn scheme(face: Face) -> ColorCode {
        match face {
            Face::U => ColorCode::White,
            Face::R => ColorCode::Red,
            Face::F => ColorCode::Green,
            Face::D => ColorCode::Yellow,
            Face::L => ColorCode::Orange,
            Face::B => ColorCode::Blue,
        }
    }

    fn solved_faces() -> BTreeMap<Face, Vec<ColorCode>> {
        Face::ORDER.iter().map(|&f| (f, vec![scheme(f); 9])).collect()
    }

    fn count(s: &str, c: char) -> usize {
        s.chars().filter(|&x| x == c).count()
    }

    // ── Happy path ───────────────────────────────────────────────────

    #[test]
    fn test_solved_cube_resolves_to_face_blocks() {
        let facelets = resolve(&FaceLayout::from_faces(solved_faces())).unwrap();
        assert_eq!(
            facelets,
            "UUUUUUUUURRRRRRRRRFFFFFFFFFDDDDDDDDDLLLLLLLLLBBBBBBBBB"
        );
    }

    #[test]
    fn test_scrambled_cube_keeps_letter_counts() {
        let mut faces = solved_faces();
        // Swap a few edge stickers between faces, keeping counts balanced.
        faces.get_mut(&Face::U).unwrap()[1] = ColorCode::Red;
        faces.get_mut(&Face::R).unwrap()[1] = ColorCode::White;
        faces.get_mut(&Face::F).unwrap()[7] = ColorCode::Blue;
        faces.get_mut(&Face::B).unwrap()[7] = ColorCode::Green;

        let facelets = resolve(&FaceLayout::from_faces(faces)).unwrap();
        assert_eq!(facelets.len(), 54);
        for letter in ['U', 'R', 'F', 'D', 'L', 'B'] {
            assert_eq!(count(&facelets, letter), 9, "letter {letter}");
        }
        assert_eq!(&facelets[0..3], "URU");
        assert_eq!(&facelets[9..11], "RU");
    }

    #[test]
    fn test_letters_follow_centers_not_fixed_scheme() {
        // Cube held with yellow on top: the yellow center defines U.
        let faces: BTreeMap<Face, Vec<ColorCode>> = Face::ORDER
            .iter()
            .map(|&f| {
                let color = match f {
                    Face::U => ColorCode::Yellow,
                    Face::D => ColorCode::White,
                    other => scheme(other),
                };
                (f, vec![color; 9])
            })
            .collect();
        let layout = FaceLayout::from_faces(faces);

        let mapping = orientation_mapping(&layout).unwrap();
        assert_eq!(mapping[&ColorCode::Yellow], Face::U);
        assert_eq!(mapping[&ColorCode::White], Face::D);
        assert!(resolve(&layout).unwrap().starts_with("UUUUUUUUU"));
    }

    // ── Structural errors ────────────────────────────────────────────

    #[test]
    fn test_missing_face_is_named() {
        let mut faces = solved_faces();
        faces.remove(&Face::L);
        let err = resolve(&FaceLayout::from_faces(faces)).unwrap_err();
        assert_eq!(err, OrientationError::IncompleteFace(Face::L));
        assert_eq!(err.to_string(), "Face L is missing or incomplete");
    }

    #[test]
    fn test_short_face_is_named() {
        let mut faces = solved_faces();
        faces.get_mut(&Face::D).unwrap().truncate(8);
        assert_eq!(
            resolve(&FaceLayout::from_faces(faces)).unwrap_err(),
            OrientationError::IncompleteFace(Face::D)
        );
    }

    #[test]
    fn test_unknown_center_is_reported() {
        let mut faces = solved_faces();
        faces.get_mut(&Face::F).unwrap()[4] = ColorCode::Unknown;
        let err = resolve(&FaceLayout::from_faces(faces)).unwrap_err();
        assert_eq!(
            err,
            OrientationError::UnknownCenter {
                face: Face::F,
                color: ColorCode::Unknown
            }
        );
        assert_eq!(err.to_string(), "Center sticker of face F is unknown (?)");
    }

    #[rstest]
    #[case(Face::R, Face::F)]
    #[case(Face::D, Face::B)]
    fn test_unknown_center_wins_over_duplicate(#[case] duplicate: Face, #[case] unknown: Face) {
        let mut faces = solved_faces();
        faces.get_mut(&duplicate).unwrap()[4] = ColorCode::White;
        faces.get_mut(&unknown).unwrap()[4] = ColorCode::Unknown;
        assert_eq!(
            resolve(&FaceLayout::from_faces(faces)).unwrap_err(),
            OrientationError::UnknownCenter {
                face: unknown,
                color: ColorCode::Unknown
            }
        );
    }

    #[rstest]
    #[case(Face::R, ColorCode::White)]
    #[case(Face::B, ColorCode::Green)]
    #[case(Face::D, ColorCode::Orange)]
    fn test_duplicate_centers_are_ambiguous(#[case] face: Face, #[case] color: ColorCode) {
        let mut faces = solved_faces();
        faces.get_mut(&face).unwrap()[4] = color;
        assert_eq!(
            resolve(&FaceLayout::from_faces(faces)).unwrap_err(),
            OrientationError::AmbiguousCenters
        );
    }

    #[test]
    fn test_unknown_edge_sticker_is_unmapped() {
        let mut faces = solved_faces();
        faces.get_mut(&Face::B).unwrap()[0] = ColorCode::Unknown;
        assert_eq!(
            resolve(&FaceLayout::from_faces(faces)).unwrap_err(),
            OrientationError::UnmappedColor(ColorCode::Unknown)
        );
    }

    #[test]
    fn test_empty_layout_fails_on_first_center() {
        assert_eq!(
            resolve(&FaceLayout::empty()).unwrap_err(),
            OrientationError::UnknownCenter {
                face: Face::U,
                color: ColorCode::Unknown
            }
        );
    }
}
