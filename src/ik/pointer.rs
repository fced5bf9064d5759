use nalgebra::{Isometry3, Perspective3, Point3, Vector3};

/// ポインタ入力をワールド座標に投影するための透視カメラ
#[derive(Debug, Clone)]
pub struct ViewCamera {
    projection: Perspective3<f32>,
    /// ワールド → カメラ
    view: Isometry3<f32>,
}

impl ViewCamera {
    /// - fov_v_deg: 垂直画角（度）
    /// - eye / target: カメラ位置と注視点（上方向は +Y）
    pub fn new(fov_v_deg: f32, aspect: f32, near: f32, far: f32, eye: Point3<f32>, target: Point3<f32>) -> Self {
        Self {
            projection: Perspective3::new(aspect, fov_v_deg.to_radians(), near, far),
            view: Isometry3::look_at_rh(&eye, &target, &Vector3::y()),
        }
    }

    /// 頭の高さから正面 2m のバストアップ構図
    pub fn bust_up(aspect: f32, head_height: f32) -> Self {
        let eye = Point3::new(0.0, head_height, 2.0);
        let target = Point3::new(0.0, head_height, 0.0);
        Self::new(30.0, aspect, 0.01, 20.0, eye, target)
    }

    pub fn eye(&self) -> Point3<f32> {
        self.view.inverse_transform_point(&Point3::origin())
    }

    /// NDC (x, y ∈ [-1, 1], y が上) を通るワールド座標のレイ（原点, 単位方向）
    pub fn ray(&self, ndc_x: f32, ndc_y: f32) -> (Point3<f32>, Vector3<f32>) {
        let near = self.projection.unproject_point(&Point3::new(ndc_x, ndc_y, -1.0));
        let far = self.projection.unproject_point(&Point3::new(ndc_x, ndc_y, 1.0));
        let near = self.view.inverse_transform_point(&near);
        let far = self.view.inverse_transform_point(&far);
        (near, (far - near).normalize())
    }

    /// レイと z = 0 平面の交点。平行またはカメラの後ろ側なら None
    pub fn pointer_target(&self, ndc_x: f32, ndc_y: f32) -> Option<Point3<f32>> {
        let (origin, dir) = self.ray(ndc_x, ndc_y);
        if dir.z.abs() < 1.0e-6 {
            return None;
        }
        let t = -origin.z / dir.z;
        if !t.is_finite() || t < 0.0 {
            return None;
        }
        Some(origin + dir * t)
    }
}

/// ピクセル座標 → NDC（y 上向き）
pub fn to_ndc(px: f32, py: f32, width: f32, height: f32) -> (f32, f32) {
    (px / width * 2.0 - 1.0, -(py / height) * 2.0 + 1.0)
}
