//! Shared BVH fixtures for unit tests

/// Two-joint chain: Hips (6 channels) -> Spine (3 channels) -> End Site
pub const TWO_JOINT: &str = "\
HIERARCHY
ROOT Hips
{
  OFFSET 0 0 0
  CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
  JOINT Spine
  {
    OFFSET 0 5 0
    CHANNELS 3 Xrotation Zrotation Yrotation
    End Site
    {
      OFFSET 0 1 0
    }
  }
}
MOTION
Frames: 2
Frame Time: 0.033333
0 1 2 3 4 5 6 7 8
10 11 12 13 14 15 16 17 18
";

/// Branching skeleton with three End Sites at different depths
///
/// Channel layout per row: Hips 0..6, LeftLeg 6..9, LeftFoot 9..12,
/// RightLeg 12..15, Chest 15..18.
pub const WITH_BRANCHES: &str = "\
HIERARCHY
ROOT Hips
{
  OFFSET 1 2 3
  CHANNELS 6 Xposition Yposition Zposition Zrotation Xrotation Yrotation
  JOINT LeftLeg
  {
    OFFSET 1 -1 0
    CHANNELS 3 Zrotation Xrotation Yrotation
    JOINT LeftFoot
    {
      OFFSET 0 -4 0
      CHANNELS 3 Zrotation Xrotation Yrotation
      End Site
      {
        OFFSET 0 0 1
      }
    }
  }
  JOINT RightLeg
  {
    OFFSET -1 -1 0
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 0 -4 0
    }
  }
  JOINT Chest
  {
    OFFSET 0 3 0
    CHANNELS 3 Zrotation Xrotation Yrotation
    End Site
    {
      OFFSET 0 2 0
    }
  }
}
MOTION
Frames: 3
Frame Time: 0.0083333
0.1 0.2 0.3 0 0 0 10 20 30 1 2 3 -10 -20 -30 5 6 7
1.1 1.2 1.3 0 0 90 11 21 31 1 2 3 -11 -21 -31 5 6 7
2.1 2.2 2.3 0 0 180 12 22 32 1 2 3 -12 -22 -32 5 6 nan?
";
