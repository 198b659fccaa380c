/// A robot model that can size the decision variables of a problem.
///
/// The builder only needs the number of degrees of freedom of each robot.
/// Kinematics live in the model implementation and are out of reach here.
pub trait RobotModel {
    /// Returns the number of degrees of freedom (joints) of the robot.
    fn ndof(&self) -> usize;
}

/// A bare degree-of-freedom count.
impl RobotModel for usize {
    fn ndof(&self) -> usize {
        *self
    }
}

impl<R: RobotModel + ?Sized> RobotModel for &R {
    fn ndof(&self) -> usize {
        (**self).ndof()
    }
}
