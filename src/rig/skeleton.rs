use nalgebra::{Matrix4, Point3, UnitQuaternion, Vector3};

/// スケルトン内のボーン番号
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoneId(pub usize);

/// IK・拘束が必要とする最小限のボーングラフ操作
///
/// 描画エンジン側のオブジェクトモデルに依存しないよう、回転の読み書きと
/// ワールド座標の取得だけを公開する。
pub trait Rig {
    fn parent(&self, bone: BoneId) -> Option<BoneId>;
    fn local_rotation(&self, bone: BoneId) -> UnitQuaternion<f32>;
    fn set_local_rotation(&mut self, bone: BoneId, rotation: UnitQuaternion<f32>);
    fn world_position(&self, bone: BoneId) -> Point3<f32>;
    /// ワールド座標の点をボーンのローカル空間へ変換
    fn world_to_local(&self, bone: BoneId, point: &Point3<f32>) -> Point3<f32>;
    /// ボーンとその子孫のワールド行列を再計算
    fn update_world(&mut self, bone: BoneId);
}

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    pub parent: Option<BoneId>,
    pub children: Vec<BoneId>,
    pub local_position: Vector3<f32>,
    pub local_rotation: UnitQuaternion<f32>,
    pub scale: f32,
    world: Matrix4<f32>,
}

impl Bone {
    fn local_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_translation(&self.local_position)
            * self.local_rotation.to_homogeneous()
            * Matrix4::new_scaling(self.scale)
    }

    pub fn world_matrix(&self) -> &Matrix4<f32> {
        &self.world
    }
}

/// 親が子より先に並ぶボーン配列
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
}

impl Skeleton {
    pub fn new() -> Self {
        Self { bones: Vec::new() }
    }

    /// 親は既に追加済みである必要がある
    pub fn add_bone(&mut self, name: &str, parent: Option<BoneId>, local_position: Vector3<f32>) -> BoneId {
        let id = BoneId(self.bones.len());
        let mut bone = Bone {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            local_position,
            local_rotation: UnitQuaternion::identity(),
            scale: 1.0,
            world: Matrix4::identity(),
        };
        bone.world = match parent {
            Some(p) => {
                self.bones[p.0].children.push(id);
                self.bones[p.0].world * bone.local_matrix()
            }
            None => bone.local_matrix(),
        };
        self.bones.push(bone);
        id
    }

    pub fn len(&self) -> usize {
        self.bones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bones.is_empty()
    }

    pub fn bone(&self, id: BoneId) -> &Bone {
        &self.bones[id.0]
    }

    pub fn find(&self, name: &str) -> Option<BoneId> {
        self.bones.iter().position(|b| b.name == name).map(BoneId)
    }

    pub fn set_scale(&mut self, id: BoneId, scale: f32) {
        self.bones[id.0].scale = scale;
    }

    pub fn set_local_position(&mut self, id: BoneId, position: Vector3<f32>) {
        self.bones[id.0].local_position = position;
    }

    /// 全ボーンのワールド行列を再計算（親が先に並んでいるので一巡で済む）
    pub fn update_all(&mut self) {
        for i in 0..self.bones.len() {
            self.refresh(BoneId(i));
        }
    }

    fn refresh(&mut self, id: BoneId) {
        let local = self.bones[id.0].local_matrix();
        self.bones[id.0].world = match self.bones[id.0].parent {
            Some(p) => self.bones[p.0].world * local,
            None => local,
        };
    }
}

impl Rig for Skeleton {
    fn parent(&self, bone: BoneId) -> Option<BoneId> {
        self.bones[bone.0].parent
    }

    fn local_rotation(&self, bone: BoneId) -> UnitQuaternion<f32> {
        self.bones[bone.0].local_rotation
    }

    fn set_local_rotation(&mut self, bone: BoneId, rotation: UnitQuaternion<f32>) {
        self.bones[bone.0].local_rotation = rotation;
    }

    fn world_position(&self, bone: BoneId) -> Point3<f32> {
        let w = &self.bones[bone.0].world;
        Point3::new(w[(0, 3)], w[(1, 3)], w[(2, 3)])
    }

    fn world_to_local(&self, bone: BoneId, point: &Point3<f32>) -> Point3<f32> {
        match self.bones[bone.0].world.try_inverse() {
            Some(inv) => inv.transform_point(point),
            // scale=0 など逆行列がない場合はそのまま返す
            None => *point,
        }
    }

    fn update_world(&mut self, bone: BoneId) {
        let mut stack = vec![bone];
        while let Some(id) = stack.pop() {
            self.refresh(id);
            stack.extend(self.bones[id.0].children.iter().copied());
        }
    }
}
